use chrono::NaiveDate;
use thiserror::Error;

/// Failure talking to, or decoding an answer from, the oracle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle transport failure: {0}")]
    Transport(String),

    #[error("oracle API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("{date} + {days} days is outside the supported calendar range")]
    DateOutOfRange { date: NaiveDate, days: u64 },
}

/// Error returned by the classification pipeline. No partial output accompanies it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Raised by the bracketed text-protocol parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LegacyFormatError {
    #[error("Invalid input format")]
    InvalidFormat,

    #[error("invalid date {month}/{day} in year {year}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("unknown category label: {0}")]
    UnknownCategory(String),

    #[error("duration of {0} days is out of range")]
    DurationOutOfRange(String),

    #[error("invalid stream event: {0}")]
    Stream(String),

    #[error("stream carried no answer")]
    MissingAnswer,

    #[error(transparent)]
    Oracle(#[from] OracleError),
}
