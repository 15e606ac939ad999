use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Zone every request is anchored to unless configured otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Tokyo;

/// Rendering of a [`ReferenceMoment`], e.g. `2024-05-01 09:30:00+09:00`.
pub const REFERENCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Rendering of schedule timestamps, e.g. `2024-05-20T07:00:00.000Z`.
///
/// The trailing `Z` is a fixed marker: values are wall-clock times in the
/// reference zone, not UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// The "now" every relative date in one request is resolved against.
///
/// Captured once per request and passed by value; nothing downstream reads
/// the clock again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceMoment {
    at: DateTime<Tz>,
}

impl ReferenceMoment {
    /// Captures the current instant in `timezone`, truncated to whole seconds.
    pub fn now(timezone: Tz) -> Self {
        let at = Utc::now().with_timezone(&timezone);
        Self::new(at)
    }

    pub fn new(at: DateTime<Tz>) -> Self {
        let at = at.with_nanosecond(0).unwrap_or(at);
        Self { at }
    }

    /// Builds a moment from a wall-clock time. `None` if the time does not
    /// exist or is ambiguous in `timezone`.
    pub fn from_local(timezone: Tz, local: NaiveDateTime) -> Option<Self> {
        timezone.from_local_datetime(&local).single().map(Self::new)
    }

    pub fn at(&self) -> DateTime<Tz> {
        self.at
    }

    pub fn timezone(&self) -> Tz {
        self.at.timezone()
    }

    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }

    pub fn year(&self) -> i32 {
        self.at.year()
    }
}

impl fmt::Display for ReferenceMoment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.at.format(REFERENCE_FORMAT))
    }
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses `YYYY-MM-DDTHH:MM:SS[.fff]Z`.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_PARSE_FORMAT)
}

pub(crate) mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> ReferenceMoment {
        let local = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        ReferenceMoment::from_local(DEFAULT_TIMEZONE, local).unwrap()
    }

    #[test]
    fn test_reference_display() {
        let now = tokyo(2024, 5, 1, 9, 30, 0);
        assert_eq!(now.to_string(), "2024-05-01 09:30:00+09:00");
    }

    #[test]
    fn test_reference_drops_subseconds() {
        let at = DEFAULT_TIMEZONE
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .unwrap()
            + chrono::Duration::milliseconds(750);
        let now = ReferenceMoment::new(at);
        assert_eq!(now.to_string(), "2024-05-01 09:30:00+09:00");
        assert_eq!(now, tokyo(2024, 5, 1, 9, 30, 0));
    }

    #[test]
    fn test_reference_date_is_local() {
        // 23:30 in Tokyo is still the previous day in UTC.
        let now = tokyo(2024, 5, 1, 23, 30, 0);
        assert_eq!(now.date(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(now.year(), 2024);
    }

    #[test]
    fn test_timestamp_format() {
        let value = NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        assert_eq!(format_timestamp(&value), "2024-05-20T07:00:00.000Z");
    }

    #[test]
    fn test_timestamp_parse_accepts_missing_fraction() {
        let with = parse_timestamp("2024-05-20T07:00:00.000Z").unwrap();
        let without = parse_timestamp("2024-05-20T07:00:00Z").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_timestamp_parse_rejects_other_shapes() {
        assert!(parse_timestamp("2024-05-20 07:00:00").is_err());
        assert!(parse_timestamp("2024-05-20T07:00:00+09:00").is_err());
        assert!(parse_timestamp("2024-13-20T07:00:00.000Z").is_err());
    }
}
