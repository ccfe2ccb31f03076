//! Engine time and hourly UTC stamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Engine time in seconds since the session started.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64);

impl Time {
    pub fn after(self, delay_s: f64) -> Self {
        Time(self.0 + delay_s)
    }
}

/// Canonical external text form, always UTC.
pub const HOUR_STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

const SECONDS_PER_HOUR: i64 = 3_600;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("invalid datetime format {0:?}, expected YYYY-MM-DDTHH:mm")]
    Format(String),
    #[error("datetime {0:?} is not a valid calendar instant")]
    Calendar(String),
}

/// A UTC instant with minute precision, written `YYYY-MM-DDTHH:mm`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HourStamp(DateTime<Utc>);

impl HourStamp {
    /// Parses the canonical form. Fields must be zero-padded and must name a
    /// real calendar instant (no rollover of e.g. Feb 30 into March).
    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 16
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                10 => *b == b'T',
                13 => *b == b':',
                _ => b.is_ascii_digit(),
            });
        if !well_formed {
            return Err(TimeParseError::Format(value.to_string()));
        }

        let naive = NaiveDateTime::parse_from_str(value, HOUR_STAMP_FORMAT)
            .map_err(|_| TimeParseError::Calendar(value.to_string()))?;
        Ok(Self(naive.and_utc()))
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let truncated = dt
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt);
        Self(truncated)
    }

    /// Whole hours since 1970-01-01T00:00 UTC.
    pub fn from_unix_hours(hours: i64) -> Self {
        Self(DateTime::UNIX_EPOCH + Duration::hours(hours))
    }

    pub fn datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Same instant truncated down to the hour boundary.
    pub fn snapped(self) -> Self {
        Self(self.0.with_minute(0).unwrap_or(self.0))
    }

    pub fn plus_hours(self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Whole hours from `origin` to `self`, rounded toward negative infinity.
    pub fn hours_since(self, origin: Self) -> i64 {
        (self.0 - origin.0)
            .num_seconds()
            .div_euclid(SECONDS_PER_HOUR)
    }

    /// Human-facing label, e.g. `Oct 22, 2012, 12:00 AM`.
    pub fn pretty(self) -> String {
        self.0.format("%b %-d, %Y, %-I:%M %p").to_string()
    }
}

impl fmt::Display for HourStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(HOUR_STAMP_FORMAT))
    }
}

impl FromStr for HourStamp {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HourStamp {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HourStamp> for String {
    fn from(value: HourStamp) -> Self {
        value.to_string()
    }
}

/// Immutable `[start, end]` playback domain at hourly granularity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: HourStamp,
    end: HourStamp,
}

impl TimeRange {
    pub fn new(start: HourStamp, end: HourStamp) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> HourStamp {
        self.start
    }

    pub fn end(&self) -> HourStamp {
        self.end
    }

    /// Number of whole hours spanned; an inverted range spans zero.
    pub fn total_hours(&self) -> u32 {
        let hours = self.end.hours_since(self.start).max(0);
        u32::try_from(hours).unwrap_or(u32::MAX)
    }

    pub fn clamp_index(&self, index: i64) -> u32 {
        let clamped = index.clamp(0, i64::from(self.total_hours()));
        u32::try_from(clamped).unwrap_or(0)
    }

    /// Hour offset of `stamp`, clamped into `[0, total_hours]`.
    pub fn index_of(&self, stamp: HourStamp) -> u32 {
        let stamp = stamp.clamp(self.start, self.end.max(self.start));
        self.clamp_index(stamp.hours_since(self.start))
    }

    pub fn stamp_at(&self, index: u32) -> HourStamp {
        self.start
            .plus_hours(i64::from(index.min(self.total_hours())))
    }
}
