use foundation::time::Time;

/// Identifies one scheduling of a [`Timer`].
///
/// Rescheduling or cancelling the timer bumps its generation, so a handle
/// from an earlier scheduling is never current again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    generation: u64,
}

/// Deterministic one-shot timer on the engine clock.
///
/// There is no background thread: the owner polls it from the frame loop with
/// the current [`Time`], and a due timer fires exactly once.
#[derive(Debug, Default, Clone)]
pub struct Timer {
    generation: u64,
    deadline: Option<Time>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the timer. Any earlier scheduling is superseded.
    pub fn schedule(&mut self, now: Time, delay_s: f64) -> TimerHandle {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = Some(now.after(delay_s.max(0.0)));
        TimerHandle {
            generation: self.generation,
        }
    }

    /// Returns `true` if a pending deadline was dropped.
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Time> {
        self.deadline
    }

    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.deadline.is_some() && handle.generation == self.generation
    }

    /// Fires the timer if its deadline has been reached.
    pub fn poll(&mut self, now: Time) -> Option<TimerHandle> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        Some(TimerHandle {
            generation: self.generation,
        })
    }
}
