use std::fmt;
use std::sync::LazyLock;

use foundation::time::HourStamp;
use regex::Regex;

/// Tolerates any minute/second fields; the layout stays sortable.
static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2})-(\d{2})-\d{2}\.png$").expect("static pattern")
});

/// File name of one hourly image, e.g. `2012-10-22T06-00-00.png`.
///
/// Ordering is lexicographic on the name, which for this layout is also
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageryKey {
    name: String,
    hour: HourStamp,
}

impl ImageryKey {
    /// Key under which `stamp` is stored; minutes are snapped away.
    pub fn for_hour(stamp: HourStamp) -> Self {
        let hour = stamp.snapped();
        Self {
            name: hour.datetime().format("%Y-%m-%dT%H-00-00.png").to_string(),
            hour,
        }
    }

    /// Recognize a catalog file. Names outside the layout, or naming an
    /// impossible instant, are not imagery.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let caps = FILE_NAME_RE.captures(name)?;
        let hour = HourStamp::parse(&format!("{}:{}", &caps[1], &caps[2])).ok()?;
        Some(Self {
            name: name.to_string(),
            hour,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn hour(&self) -> HourStamp {
        self.hour
    }
}

impl fmt::Display for ImageryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
