//! Discrete hourly time axis with debounced scrubbing and readiness-gated
//! autoplay.
//!
//! The controller never sleeps. Both waits (the scrub debounce and the
//! autoplay pacing delay) are [`Timer`]s polled from [`TimeAxisController::update`]
//! with the frame clock, so a session replays identically for identical input.

use foundation::time::{HourStamp, Time, TimeRange};
use runtime::timer::Timer;
use tracing::{debug, info, warn};

use crate::config::TimelineConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Idle,
    /// A draft index is pending behind the debounce timer.
    Scrubbing,
    Autoplaying,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepDirection {
    Backward,
    Forward,
}

impl StepDirection {
    fn delta(self) -> i64 {
        match self {
            StepDirection::Backward => -1,
            StepDirection::Forward => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("autoplay needs every layer ready for the current hour")]
    NotReady,
    #[error("already at the last hour of the range")]
    AtEnd,
}

/// An authoritative change of the current hour.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Commit {
    pub index: u32,
    pub timestamp: HourStamp,
}

#[derive(Debug)]
pub struct TimeAxisController {
    config: TimelineConfig,
    range: TimeRange,
    mode: PlaybackMode,
    current_index: u32,
    draft_index: u32,
    commit_timer: Timer,
    pace_timer: Timer,
    commits: Vec<Commit>,
}

impl TimeAxisController {
    pub fn new(config: TimelineConfig) -> Self {
        let range = config.range();
        Self {
            config,
            range,
            mode: PlaybackMode::Idle,
            current_index: 0,
            draft_index: 0,
            commit_timer: Timer::new(),
            pace_timer: Timer::new(),
            commits: Vec::new(),
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_autoplaying(&self) -> bool {
        self.mode == PlaybackMode::Autoplaying
    }

    pub fn total_hours(&self) -> u32 {
        self.range.total_hours()
    }

    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    pub fn draft_index(&self) -> u32 {
        self.draft_index
    }

    pub fn committed(&self) -> HourStamp {
        self.range.stamp_at(self.current_index)
    }

    /// Committed hour in the canonical `YYYY-MM-DDTHH:mm` form.
    pub fn committed_string(&self) -> String {
        self.committed().to_string()
    }

    pub fn draft_timestamp(&self) -> HourStamp {
        self.range.stamp_at(self.draft_index)
    }

    /// Label for the hour under the slider thumb.
    pub fn draft_label(&self) -> String {
        format!("{} UTC", self.draft_timestamp().pretty())
    }

    /// Move the slider. The draft follows immediately; the commit waits for
    /// the debounce window to pass without further scrubbing.
    pub fn scrub_to(&mut self, index: i64, now: Time) {
        self.stop_autoplay();
        self.mode = PlaybackMode::Scrubbing;
        self.draft_index = self.range.clamp_index(index);
        self.commit_timer.schedule(now, self.config.commit_delay_s);
    }

    /// One keyboard step (including auto-repeat). Debounced like a scrub.
    pub fn step(&mut self, direction: StepDirection, now: Time) {
        let target = i64::from(self.draft_index) + direction.delta();
        self.scrub_to(target, now);
    }

    /// Key release: commit the draft without waiting for the debounce.
    pub fn release_step(&mut self) {
        if self.mode != PlaybackMode::Scrubbing {
            return;
        }
        self.commit_timer.cancel();
        self.mode = PlaybackMode::Idle;
        self.commit(self.draft_index);
    }

    /// Start autoplay from the committed hour.
    pub fn start_autoplay(&mut self, now: Time, all_ready: bool) -> Result<(), PlaybackError> {
        if !all_ready {
            return Err(PlaybackError::NotReady);
        }
        if self.current_index >= self.total_hours() {
            return Err(PlaybackError::AtEnd);
        }
        self.commit_timer.cancel();
        self.draft_index = self.current_index;
        self.mode = PlaybackMode::Autoplaying;
        self.pace_timer.schedule(now, self.config.pace_delay_s);
        info!(from = %self.committed(), "autoplay started");
        Ok(())
    }

    /// Returns `true` if autoplay was running.
    pub fn stop_autoplay(&mut self) -> bool {
        if self.mode != PlaybackMode::Autoplaying {
            return false;
        }
        self.pace_timer.cancel();
        self.mode = PlaybackMode::Idle;
        info!(at = %self.committed(), "autoplay stopped");
        true
    }

    /// Play/pause button. Returns whether autoplay is running afterwards.
    pub fn toggle_autoplay(&mut self, now: Time, all_ready: bool) -> Result<bool, PlaybackError> {
        if self.stop_autoplay() {
            return Ok(false);
        }
        self.start_autoplay(now, all_ready).map(|()| true)
    }

    /// Setter used by the playback UI; goes through the commit path.
    pub fn commit_timestamp(&mut self, timestamp: HourStamp) {
        self.commit_timer.cancel();
        if self.mode == PlaybackMode::Scrubbing {
            self.mode = PlaybackMode::Idle;
        }
        self.commit(self.range.index_of(timestamp));
    }

    /// Adopt a committed timestamp owned elsewhere (e.g. restored from a
    /// URL). Clamped into range; unparsable input falls back to the start.
    /// No [`Commit`] is emitted.
    pub fn sync_committed(&mut self, value: &str) {
        let index = match HourStamp::parse(value) {
            Ok(stamp) => self.range.index_of(stamp),
            Err(err) => {
                warn!("ignoring committed timestamp: {err}");
                0
            }
        };
        self.current_index = index;
        if self.mode != PlaybackMode::Scrubbing {
            self.draft_index = index;
        }
    }

    /// Advance the axis to `now`. `all_ready` is the coordinator's aggregate
    /// flag for the committed hour.
    pub fn update(&mut self, now: Time, all_ready: bool) {
        if self.commit_timer.poll(now).is_some() {
            if self.mode == PlaybackMode::Scrubbing {
                self.mode = PlaybackMode::Idle;
            }
            self.commit(self.draft_index);
        }

        if self.mode != PlaybackMode::Autoplaying {
            return;
        }
        if !all_ready {
            if self.pace_timer.cancel() {
                debug!(at = %self.committed(), "readiness lost, pacing restarts");
            }
            return;
        }
        if !self.pace_timer.is_pending() {
            self.pace_timer.schedule(now, self.config.pace_delay_s);
            return;
        }
        if self.pace_timer.poll(now).is_some() {
            self.advance();
        }
    }

    /// Commits since the last drain, oldest first.
    pub fn drain_commits(&mut self) -> Vec<Commit> {
        std::mem::take(&mut self.commits)
    }

    pub fn teardown(&mut self) {
        self.commit_timer.cancel();
        self.pace_timer.cancel();
        self.mode = PlaybackMode::Idle;
    }

    fn advance(&mut self) {
        let next = self.range.clamp_index(i64::from(self.current_index) + 1);
        self.draft_index = next;
        self.commit(next);
        if next >= self.total_hours() {
            self.stop_autoplay();
        }
    }

    fn commit(&mut self, index: u32) {
        self.draft_index = index;
        if index == self.current_index {
            debug!(index, "commit suppressed, hour unchanged");
            return;
        }
        self.current_index = index;
        let timestamp = self.range.stamp_at(index);
        debug!(index, %timestamp, "hour committed");
        self.commits.push(Commit { index, timestamp });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use runtime::frame::Frame;

    fn stamp(s: &str) -> HourStamp {
        HourStamp::parse(s).unwrap()
    }

    /// Binary-exact delays so frame times land on deadlines exactly.
    fn config(hours: i64) -> TimelineConfig {
        let start = stamp("2012-10-22T00:00");
        TimelineConfig {
            start,
            end: start.plus_hours(hours),
            commit_delay_s: 0.125,
            pace_delay_s: 0.75,
        }
    }

    #[test]
    fn rapid_scrubs_commit_once_with_final_value() {
        let mut axis = TimeAxisController::new(TimelineConfig::default());
        for i in 0..10 {
            let now = Time(f64::from(i) * 0.01);
            axis.scrub_to(i64::from(i) * 3, now);
            axis.update(now, true);
            assert_eq!(axis.draft_index(), (i * 3) as u32);
        }
        assert!(axis.drain_commits().is_empty());

        axis.update(Time(0.15), true);
        assert!(axis.drain_commits().is_empty());

        axis.update(Time(0.25), true);
        let commits = axis.drain_commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].index, 27);
        assert_eq!(axis.committed_string(), "2012-10-23T03:00");
        assert_eq!(axis.mode(), PlaybackMode::Idle);

        axis.update(Time(1.0), true);
        assert!(axis.drain_commits().is_empty());
    }

    #[test]
    fn scrub_clamps_into_range() {
        let mut axis = TimeAxisController::new(config(5));
        axis.scrub_to(-3, Time(0.0));
        assert_eq!(axis.draft_index(), 0);
        axis.scrub_to(99, Time(0.0));
        assert_eq!(axis.draft_index(), 5);
    }

    #[test]
    fn key_release_commits_without_waiting() {
        let mut axis = TimeAxisController::new(config(24));
        axis.step(StepDirection::Forward, Time(0.0));
        axis.step(StepDirection::Forward, Time(0.03));
        axis.step(StepDirection::Forward, Time(0.06));
        axis.step(StepDirection::Backward, Time(0.09));
        assert!(axis.drain_commits().is_empty());

        axis.release_step();
        let commits = axis.drain_commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].index, 2);

        axis.update(Time(1.0), true);
        assert!(axis.drain_commits().is_empty());
    }

    #[test]
    fn scrubbing_back_to_current_is_not_a_commit() {
        let mut axis = TimeAxisController::new(config(24));
        axis.scrub_to(4, Time(0.0));
        axis.scrub_to(0, Time(0.05));
        axis.update(Time(1.0), true);
        assert!(axis.drain_commits().is_empty());
        assert_eq!(axis.draft_index(), 0);
    }

    #[test]
    fn autoplay_refuses_when_not_ready_or_at_end() {
        let mut axis = TimeAxisController::new(config(2));
        assert_eq!(axis.start_autoplay(Time(0.0), false), Err(PlaybackError::NotReady));
        axis.commit_timestamp(stamp("2012-10-22T02:00"));
        assert_eq!(axis.start_autoplay(Time(0.0), true), Err(PlaybackError::AtEnd));
        assert_eq!(axis.mode(), PlaybackMode::Idle);
    }

    #[test]
    fn autoplay_paces_on_readiness_and_halts_at_end() {
        let mut axis = TimeAxisController::new(config(3));
        let mut frame = Frame::new(0, 0.125);
        axis.start_autoplay(frame.time, true).unwrap();

        // Each commit costs one tick of loading before the layers are ready.
        let mut ready_from = 0;
        let mut commit_frames = Vec::new();
        let mut indices = Vec::new();
        for _ in 0..60 {
            frame = frame.next();
            axis.update(frame.time, frame.index >= ready_from);
            for commit in axis.drain_commits() {
                commit_frames.push(frame.index);
                indices.push(commit.index);
                ready_from = frame.index + 2;
            }
        }

        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(commit_frames, vec![6, 14, 22]);
        assert_eq!(axis.mode(), PlaybackMode::Idle);
        assert_eq!(axis.committed_string(), "2012-10-22T03:00");
    }

    #[test]
    fn readiness_drop_restarts_pacing() {
        let mut axis = TimeAxisController::new(config(10));
        axis.start_autoplay(Time(0.0), true).unwrap();
        axis.update(Time(0.5), false);
        axis.update(Time(0.75), true);
        assert!(axis.drain_commits().is_empty());

        axis.update(Time(1.25), true);
        assert!(axis.drain_commits().is_empty());
        axis.update(Time(1.5), true);
        assert_eq!(axis.drain_commits().len(), 1);
    }

    #[test]
    fn scrubbing_stops_autoplay() {
        let mut axis = TimeAxisController::new(config(10));
        axis.start_autoplay(Time(0.0), true).unwrap();
        axis.scrub_to(5, Time(0.25));
        assert_eq!(axis.mode(), PlaybackMode::Scrubbing);
        axis.update(Time(2.0), true);
        let commits = axis.drain_commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].index, 5);
        assert!(!axis.is_autoplaying());
    }

    #[test]
    fn starting_autoplay_cancels_a_pending_scrub_commit() {
        let mut axis = TimeAxisController::new(config(10));
        axis.scrub_to(5, Time(0.0));
        axis.start_autoplay(Time(0.0625), true).unwrap();
        assert_eq!(axis.draft_index(), axis.current_index());
        assert_eq!(axis.mode(), PlaybackMode::Autoplaying);

        axis.update(Time(0.25), true);
        assert!(axis.drain_commits().is_empty());

        axis.update(Time(1.0), true);
        let commits = axis.drain_commits();
        assert!(commits.iter().all(|c| c.index != 5), "{commits:?}");
        assert_eq!(axis.draft_index(), axis.current_index());
    }

    #[test]
    fn toggle_flips_playback() {
        let mut axis = TimeAxisController::new(config(10));
        assert_eq!(axis.toggle_autoplay(Time(0.0), true), Ok(true));
        assert_eq!(axis.toggle_autoplay(Time(0.1), true), Ok(false));
        assert_eq!(axis.toggle_autoplay(Time(0.2), false), Err(PlaybackError::NotReady));
    }

    #[test]
    fn sync_committed_clamps_and_falls_back() {
        let mut axis = TimeAxisController::new(TimelineConfig::default());
        axis.sync_committed("2012-10-25T07:00");
        assert_eq!(axis.current_index(), 79);
        assert_eq!(axis.draft_index(), 79);

        axis.sync_committed("2030-01-01T00:00");
        assert_eq!(axis.current_index(), 228);

        axis.sync_committed("not a date");
        assert_eq!(axis.current_index(), 0);
        assert!(axis.drain_commits().is_empty());
    }

    #[test]
    fn labels_use_utc() {
        let mut axis = TimeAxisController::new(TimelineConfig::default());
        axis.scrub_to(12, Time(0.0));
        assert_eq!(axis.draft_label(), "Oct 22, 2012, 12:00 PM UTC");
        assert_eq!(axis.committed_string(), "2012-10-22T00:00");
    }

    #[test]
    fn teardown_cancels_pending_work() {
        let mut axis = TimeAxisController::new(config(10));
        axis.scrub_to(3, Time(0.0));
        axis.teardown();
        axis.update(Time(5.0), true);
        assert!(axis.drain_commits().is_empty());
        assert_eq!(axis.mode(), PlaybackMode::Idle);
    }
}
