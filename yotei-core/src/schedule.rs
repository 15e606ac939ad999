use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::{format_timestamp, serde_timestamp};

/// A dated event.
///
/// `start` and `end` are wall-clock times in the reference zone; they
/// serialize as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    #[serde(rename = "DTSTART", with = "serde_timestamp")]
    pub start: NaiveDateTime,
    #[serde(rename = "DTEND", with = "serde_timestamp")]
    pub end: NaiveDateTime,
    /// Length of the event in whole days; 0 for a single-day event.
    #[serde(deserialize_with = "crate::number::whole_days")]
    pub duration: u32,
    pub title: String,
}

impl ScheduleRecord {
    pub fn dtstart(&self) -> String {
        format_timestamp(&self.start)
    }

    pub fn dtend(&self) -> String {
        format_timestamp(&self.end)
    }
}
