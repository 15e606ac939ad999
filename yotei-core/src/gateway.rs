//! Prompts, function schemas and strict decoding for the three oracle requests.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::error::OracleError;
use crate::oracle::{FunctionSchema, Oracle};
use crate::schedule::ScheduleRecord;
use crate::time::ReferenceMoment;
use crate::todo::{Classification, TaskCategory};

pub const SCHEDULE_FUNCTION: &str = "create_schedule";
pub const CLASSIFICATION_FUNCTION: &str = "sort_task";

/// Asks the oracle to restate the date a message implies, or echo `now`
/// back unchanged when it cannot tell.
pub fn disambiguation_prompt(text: &str, now: ReferenceMoment) -> String {
    format!(
        "今を{now}とした場合、「{text}」が示す日時を、{now}と同じ形式でのみ出力する。\
         期間がある場合は開始日時を出力する。\
         日時が特定できない場合は{now}をそのまま出力する。"
    )
}

pub fn schedule_function(now: ReferenceMoment) -> FunctionSchema {
    FunctionSchema {
        name: SCHEDULE_FUNCTION.to_string(),
        description: format!(
            "Creates a schedule from the given text. now is {now}. Week starts on Sunday."
        ),
        parameters: json!({
            "type": "object",
            "properties": {
                "DTSTART": {
                    "type": "string",
                    "description": "The start datetime of the schedule, e.g. 2021-11-03T07:00:00.000Z. If there is no start time, DTSTART is 07:00:00.000Z."
                },
                "DTEND": {
                    "type": "string",
                    "description": "The end datetime of the schedule, e.g. 2021-11-03T08:00:00.000Z. If there is no time stated in the schedule, the schedule lasts 1 hour."
                },
                "duration": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Duration in days, e.g. if there is no duration in days, duration = 0."
                },
                "title": {
                    "type": "string",
                    "description": "Schedule title, e.g. watch the anime"
                }
            },
            "required": ["title", "DTSTART", "DTEND", "duration"]
        }),
    }
}

pub fn classification_function() -> FunctionSchema {
    let labels: Vec<&str> = TaskCategory::ALL.iter().map(TaskCategory::label).collect();
    let hint = format!("{}の三択で回答", labels.join(","));
    FunctionSchema {
        name: CLASSIFICATION_FUNCTION.to_string(),
        description: "インプットされたメッセージを指定された形で分類してください".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "enum": labels,
                    "description": hint
                },
                "confidence": {
                    "type": "integer",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "categoryの結果に対する自信を0から100で出力(自信があれば100)"
                }
            },
            "required": ["category", "confidence"]
        }),
    }
}

/// Decodes function arguments, failing closed on any schema violation.
fn decode<T: DeserializeOwned>(function: &str, arguments: Value) -> Result<T, OracleError> {
    serde_json::from_value(arguments)
        .map_err(|e| OracleError::MalformedResponse(format!("{function}: {e}")))
}

/// Issues the disambiguation, schedule and classification requests.
#[derive(Debug, Clone)]
pub struct OracleGateway<O> {
    oracle: O,
}

impl<O: Oracle> OracleGateway<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Returns the oracle's raw restatement of the date `text` implies.
    #[instrument(skip(self))]
    pub async fn disambiguate(&self, text: &str, now: ReferenceMoment) -> Result<String, OracleError> {
        let answer = self.oracle.complete(&disambiguation_prompt(text, now)).await?;
        debug!(%answer, "disambiguation answer");
        Ok(answer)
    }

    #[instrument(skip(self))]
    pub async fn extract_schedule(
        &self,
        text: &str,
        now: ReferenceMoment,
    ) -> Result<ScheduleRecord, OracleError> {
        let function = schedule_function(now);
        let arguments = self.oracle.call_function(text, &function).await?;
        decode(&function.name, arguments)
    }

    #[instrument(skip(self))]
    pub async fn classify(&self, text: &str) -> Result<Classification, OracleError> {
        let function = classification_function();
        let arguments = self.oracle.call_function(text, &function).await?;
        decode(&function.name, arguments)
    }
}
