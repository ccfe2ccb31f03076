use foundation::time::{HourStamp, TimeRange};
use serde::{Deserialize, Serialize};

/// 2012-10-22T00:00 UTC.
const DEFAULT_START_HOURS: i64 = 375_240;
/// 2012-10-31T12:00 UTC.
const DEFAULT_END_HOURS: i64 = DEFAULT_START_HOURS + 228;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub start: HourStamp,
    pub end: HourStamp,
    /// Quiet period after the last scrub before the draft is committed.
    pub commit_delay_s: f64,
    /// Dwell on each fully rendered hour during autoplay.
    pub pace_delay_s: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            start: HourStamp::from_unix_hours(DEFAULT_START_HOURS),
            end: HourStamp::from_unix_hours(DEFAULT_END_HOURS),
            commit_delay_s: 0.1,
            pace_delay_s: 0.7,
        }
    }
}

impl TimelineConfig {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_covers_the_storm_window() {
        let config = TimelineConfig::default();
        assert_eq!(config.start.to_string(), "2012-10-22T00:00");
        assert_eq!(config.end.to_string(), "2012-10-31T12:00");
        assert_eq!(config.range().total_hours(), 228);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TimelineConfig =
            serde_json::from_str(r#"{"start": "2021-11-22T00:00", "end": "2021-11-23T00:00"}"#).unwrap();
        assert_eq!(config.range().total_hours(), 24);
        assert_eq!(config.pace_delay_s, 0.7);
        assert!(serde_json::from_str::<TimelineConfig>(r#"{"start": "yesterday"}"#).is_err());
    }
}
