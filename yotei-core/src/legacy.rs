//! Parser for the bracketed text protocol, where a chat backend answers
//! with a single line such as
//! `カテゴリ:学校[schedule,{"date": "05/20", "start_time": "07:00:00", ...}]` or
//! `カテゴリ:買物[todo,歯ブラシ,買物]`.
//!
//! Independent of the function-calling pipeline; it produces the same
//! [`TaggedOutput`]. [`process`] asks an [`Oracle`] for the bracketed answer
//! directly.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::LegacyFormatError;
use crate::oracle::Oracle;
use crate::output::TaggedOutput;
use crate::schedule::ScheduleRecord;
use crate::time::ReferenceMoment;
use crate::todo::{TaskCategory, TodoRecord};

const SCHEDULE_MARKER: &str = "[schedule,";

static SCHEDULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"カテゴリ:[^\[\s]+\[schedule,\{\s*"#,
        r#""date":\s*"(?P<month>[0-9]{1,2})/(?P<day>[0-9]{1,2})",\s*"#,
        r#""start_time":\s*"(?P<start>[0-9]{2}:[0-9]{2}:[0-9]{2})",\s*"#,
        r#""end_time":\s*"(?P<end>[0-9]{2}:[0-9]{2}:[0-9]{2})",\s*"#,
        r#""duration":\s*(?P<duration>[0-9]+),\s*"#,
        r#""event":\s*"(?P<event>.*?)"\s*\}\]"#,
    ))
    .expect("valid schedule regex")
});

static TODO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"カテゴリ:[^\[\s]+\[todo,([^,\]]+),([^,\]]+)\]").expect("valid todo regex")
});

pub fn contains_schedule(text: &str) -> bool {
    text.contains(SCHEDULE_MARKER)
}

fn parse_time(value: &str) -> Result<NaiveTime, LegacyFormatError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .map_err(|_| LegacyFormatError::InvalidTime(value.to_string()))
}

/// Parses the schedule form. The protocol carries no year, so `year` places
/// the `MM/DD` date; the end lands `duration` days after the start date.
pub fn parse_schedule(text: &str, year: i32) -> Result<ScheduleRecord, LegacyFormatError> {
    let caps = SCHEDULE_PATTERN
        .captures(text)
        .ok_or(LegacyFormatError::InvalidFormat)?;

    // The pattern only admits 1-2 ASCII digits here.
    let month: u32 = caps["month"].parse().map_err(|_| LegacyFormatError::InvalidFormat)?;
    let day: u32 = caps["day"].parse().map_err(|_| LegacyFormatError::InvalidFormat)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(LegacyFormatError::InvalidDate { year, month, day })?;

    let duration: u32 = caps["duration"]
        .parse()
        .map_err(|_| LegacyFormatError::DurationOutOfRange(caps["duration"].to_string()))?;
    let end_date = date
        .checked_add_days(Days::new(u64::from(duration)))
        .ok_or_else(|| LegacyFormatError::DurationOutOfRange(duration.to_string()))?;

    Ok(ScheduleRecord {
        start: date.and_time(parse_time(&caps["start"])?),
        end: end_date.and_time(parse_time(&caps["end"])?),
        duration,
        title: caps["event"].to_string(),
    })
}

/// Parses the todo form. The label must be one of the known categories.
pub fn parse_todo(text: &str) -> Result<TodoRecord, LegacyFormatError> {
    let caps = TODO_PATTERN
        .captures(text)
        .ok_or(LegacyFormatError::InvalidFormat)?;
    let item = caps[1].trim();
    let label = caps[2].trim();
    let category = label
        .parse::<TaskCategory>()
        .map_err(LegacyFormatError::UnknownCategory)?;

    Ok(TodoRecord {
        text: item.to_string(),
        category,
        confidence: None,
    })
}

/// Dispatches on the `[schedule,` marker.
pub fn parse(text: &str, year: i32) -> Result<TaggedOutput, LegacyFormatError> {
    if contains_schedule(text) {
        parse_schedule(text, year).map(TaggedOutput::from)
    } else {
        parse_todo(text).map(TaggedOutput::from)
    }
}

/// Folds a `data:` event stream to the `answer` of its last event.
///
/// Lines without a `data:` prefix are taken whole; blank lines are skipped.
pub fn aggregate_stream(body: &str) -> Result<String, LegacyFormatError> {
    let mut last: Option<Value> = None;
    for line in body.lines() {
        let payload = line.split_once("data:").map_or(line, |(_, rest)| rest).trim();
        if payload.is_empty() {
            continue;
        }
        let event: Value =
            serde_json::from_str(payload).map_err(|e| LegacyFormatError::Stream(e.to_string()))?;
        last = Some(event);
    }

    last.as_ref()
        .and_then(|event| event.get("answer"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(LegacyFormatError::MissingAnswer)
}

/// Asks for a one-line answer in the bracketed protocol.
pub fn prompt(text: &str, now: ReferenceMoment) -> String {
    let labels: Vec<&str> = TaskCategory::ALL.iter().map(TaskCategory::label).collect();
    format!(
        "今を{now}とした場合、次のメッセージを分類し、以下のどちらかの形式の1行のみで出力する。\n\
         日時がある場合: カテゴリ:<カテゴリ>[schedule,{{\"date\": \"MM/DD\", \"start_time\": \"HH:MM:SS\", \"end_time\": \"HH:MM:SS\", \"duration\": <日数>, \"event\": \"<予定>\"}}]\n\
         日時がない場合: カテゴリ:<カテゴリ>[todo,<メッセージ>,<カテゴリ>]\n\
         カテゴリは{}のいずれか。\n\
         メッセージ: {text}",
        labels.join(",")
    )
}

/// Sends `text` to the oracle in the bracketed protocol and parses the
/// answer, placing its `MM/DD` date in `now`'s year. A `data:` event stream
/// answer is folded first.
#[instrument(skip(oracle, now), fields(now = %now))]
pub async fn process<O: Oracle>(
    oracle: &O,
    text: &str,
    now: ReferenceMoment,
) -> Result<TaggedOutput, LegacyFormatError> {
    let mut answer = oracle.complete(&prompt(text, now)).await?;
    if answer.trim_start().starts_with("data:") {
        answer = aggregate_stream(&answer)?;
    }
    debug!(%answer, "legacy answer");
    parse(&answer, now.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE: &str = "カテゴリ:学校[schedule,{\n  \"date\": \"05/20\",\n  \"start_time\": \"07:00:00\",\n  \"end_time\": \"20:00:00\",\n  \"duration\": 3,\n  \"event\": \"明日から3日間 修学旅行\"\n}]";

    #[test]
    fn test_contains_schedule() {
        assert!(contains_schedule(SCHEDULE));
        assert!(!contains_schedule("カテゴリ:買物[todo,歯ブラシ,買物]"));
    }

    #[test]
    fn test_parse_schedule() {
        let record = parse_schedule(SCHEDULE, 2024).unwrap();
        assert_eq!(record.dtstart(), "2024-05-20T07:00:00.000Z");
        assert_eq!(record.dtend(), "2024-05-23T20:00:00.000Z");
        assert_eq!(record.duration, 3);
        assert_eq!(record.title, "明日から3日間 修学旅行");
    }

    #[test]
    fn test_parse_schedule_uses_given_year() {
        let record = parse_schedule(SCHEDULE, 2025).unwrap();
        assert_eq!(record.dtstart(), "2025-05-20T07:00:00.000Z");
    }

    #[test]
    fn test_parse_schedule_invalid_date() {
        let text = SCHEDULE.replace("05/20", "02/30");
        assert_eq!(
            parse_schedule(&text, 2024),
            Err(LegacyFormatError::InvalidDate { year: 2024, month: 2, day: 30 })
        );
    }

    #[test]
    fn test_parse_schedule_invalid_time() {
        let text = SCHEDULE.replace("20:00:00", "25:00:00");
        assert_eq!(
            parse_schedule(&text, 2024),
            Err(LegacyFormatError::InvalidTime("25:00:00".to_string()))
        );
    }

    #[test]
    fn test_parse_todo() {
        let todo = parse_todo("カテゴリ:買物[todo,歯ブラシ,買物]").unwrap();
        assert_eq!(todo.text, "歯ブラシ");
        assert_eq!(todo.category, TaskCategory::Shopping);
        assert_eq!(todo.confidence, None);
    }

    #[test]
    fn test_parse_todo_unknown_category() {
        assert_eq!(
            parse_todo("カテゴリ:料理[todo,カレー,料理]"),
            Err(LegacyFormatError::UnknownCategory("料理".to_string()))
        );
    }

    #[test]
    fn test_parse_dispatch() {
        assert_eq!(parse(SCHEDULE, 2024).unwrap().tag(), "schedule");
        assert_eq!(parse("カテゴリ:その他[todo,懇談会の準備,その他]", 2024).unwrap().tag(), "todo");
    }

    #[test]
    fn test_parse_rejects_free_text() {
        assert_eq!(parse("明日はマラソン", 2024), Err(LegacyFormatError::InvalidFormat));
        assert_eq!(
            parse("カテゴリ:学校[schedule,{\"date\": \"tomorrow\"}]", 2024),
            Err(LegacyFormatError::InvalidFormat)
        );
    }

    #[test]
    fn test_aggregate_stream_takes_last_event() {
        let body = "data: {\"event\": \"message\", \"answer\": \"partial\"}\n\n\
                    data: {\"event\": \"message_end\", \"answer\": \"カテゴリ:買物[todo,牛乳,買物]\"}\n";
        assert_eq!(aggregate_stream(body).unwrap(), "カテゴリ:買物[todo,牛乳,買物]");
    }

    #[test]
    fn test_aggregate_stream_plain_json() {
        assert_eq!(aggregate_stream("{\"answer\": \"ok\"}").unwrap(), "ok");
    }

    #[test]
    fn test_aggregate_stream_errors() {
        assert_eq!(aggregate_stream(""), Err(LegacyFormatError::MissingAnswer));
        assert_eq!(
            aggregate_stream("data: {\"event\": \"ping\"}"),
            Err(LegacyFormatError::MissingAnswer)
        );
        assert!(matches!(
            aggregate_stream("data: not json"),
            Err(LegacyFormatError::Stream(_))
        ));
    }
}
