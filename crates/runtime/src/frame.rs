use foundation::time::Time;

/// Deterministic frame metadata.
///
/// This is the primary timebase for the session loop. Frame time is derived
/// from the index, never accumulated, so replaying the same inputs yields the
/// same timer firings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Engine time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// First frame of a loop running at `fps`.
    pub fn at_rate(fps: f64) -> Self {
        Self::new(0, 1.0 / fps.max(1.0))
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }

    /// Index of the first frame starting at or after `time`. Times before the
    /// origin map to frame 0.
    pub fn index_at(&self, time: Time) -> u64 {
        if self.dt_s <= 0.0 || time.0 <= 0.0 {
            return 0;
        }
        (time.0 / self.dt_s).ceil() as u64
    }

    /// Index of the frame on which something issued now with `delay_s` of
    /// latency becomes due. Never earlier than the next frame.
    pub fn due_after(&self, delay_s: f64) -> u64 {
        self.index_at(self.time.after(delay_s)).max(self.index + 1)
    }
}
