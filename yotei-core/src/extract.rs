//! Pulls a concrete timestamp out of free text.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;

// ASCII digits only: `\d` would also match full-width numerals that chrono rejects.
// The match may not touch another digit on either side.
static DATETIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^0-9])([0-9]{4}-[0-9]{2}-[0-9]{2})[ T]([0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?)([+-][0-9]{2}:[0-9]{2})?(?:$|[^0-9])",
    )
    .expect("valid datetime regex")
});

/// A timestamp found in text, with or without an explicit UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractedDateTime {
    Offset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ExtractedDateTime {
    /// Wall-clock fields exactly as written.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Offset(dt) => dt.naive_local(),
            Self::Naive(dt) => *dt,
        }
    }

    /// Calendar date as written, never shifted by the offset.
    pub fn date(&self) -> NaiveDate {
        self.naive_local().date()
    }
}

/// Finds the first `YYYY-MM-DD[ T]HH:MM:SS[±HH:MM]` substring and parses it.
///
/// Only the first match is considered. Returns `None` when nothing matches
/// or when the match is not a real date/time (month 13, hour 25, ...).
pub fn extract_datetime(text: &str) -> Option<ExtractedDateTime> {
    let caps = DATETIME_PATTERN.captures(text)?;
    let date = &caps[1];
    let time = &caps[2];

    match caps.get(3) {
        Some(offset) => DateTime::parse_from_str(
            &format!("{date} {time}{}", offset.as_str()),
            "%Y-%m-%d %H:%M:%S%.f%:z",
        )
        .ok()
        .map(ExtractedDateTime::Offset),
        None => NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .map(ExtractedDateTime::Naive),
    }
}
