//! Turns free-form Japanese messages into calendar schedules or categorized
//! todos.
//!
//! Language understanding is delegated to an [`Oracle`]; this crate builds
//! the prompts and function schemas, decodes the answers strictly, and
//! reconciles dates.
//!
//! A message goes through:
//! 1. disambiguation: the oracle restates the date the message implies, or
//!    echoes the reference moment back when there is none;
//! 2. routing: an echo or an answer with no parseable timestamp is a todo,
//!    anything else is a schedule;
//! 3. extraction: a forced function call fills either the schedule or the
//!    classification schema;
//! 4. reconciliation (schedules only): the extracted start date is replaced
//!    by the disambiguated one when they disagree.
//!
//! # Example
//!
//! ```ignore
//! use yotei_core::Pipeline;
//! use yotei_openai::OpenAiClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = Pipeline::new(OpenAiClient::new("your-api-key"));
//!     let output = pipeline.process("6/9 四十九日の法事").await.unwrap();
//!     println!("{}", serde_json::to_string(&output).unwrap());
//! }
//! ```

mod error;
mod extract;
mod gateway;
pub mod legacy;
mod number;
mod oracle;
mod output;
mod pipeline;
mod reconcile;
mod schedule;
mod time;
mod todo;

pub use error::{LegacyFormatError, OracleError, PipelineError, ReconcileError};
pub use extract::{ExtractedDateTime, extract_datetime};
pub use gateway::{
    CLASSIFICATION_FUNCTION, OracleGateway, SCHEDULE_FUNCTION, classification_function,
    disambiguation_prompt, schedule_function,
};
pub use oracle::{FunctionSchema, Oracle};
pub use output::TaggedOutput;
pub use pipeline::{Pipeline, Route, route};
pub use reconcile::{Reconciliation, reconcile};
pub use schedule::ScheduleRecord;
pub use time::{
    DEFAULT_TIMEZONE, REFERENCE_FORMAT, ReferenceMoment, TIMESTAMP_FORMAT, format_timestamp,
    parse_timestamp,
};
pub use todo::{Classification, TaskCategory, TodoRecord};

pub use chrono_tz::Tz;
