use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// `strftime` layout of the timestamp segment, e.g.
/// `2021/08/04 12:00:43.128 +08:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.3f %:z";

/// Length in bytes of a timestamp written with [`TIMESTAMP_FORMAT`].
pub const TIMESTAMP_LEN: usize = 30;

/// The fixed part of a log line: when, how severe, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    pub level: Level,
    /// Source file name, empty for `<unknown>`.
    pub file: String,
    /// Source line number, 0 for `<unknown>`.
    pub line: u32,
}

impl Header {
    /// Returns `false` when the line carried the `<unknown>` location marker.
    pub fn has_location(&self) -> bool {
        !(self.file.is_empty() && self.line == 0)
    }
}

/// One `[name=value]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A fully parsed log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub header: Header,
    pub message: String,
    /// Fields in the order they appear on the line. Names may repeat.
    pub fields: Vec<Field>,
}

impl Record {
    /// Returns the value of the first field called `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Returns the values of every field called `name`, in line order.
    ///
    /// The values borrow from the record only, not from `name`.
    pub fn field_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Serializes timestamps in the same layout the log line uses.
mod timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&dt.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(D::Error::custom)
    }
}
