use thiserror::Error;
use yotei_core::OracleError;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Model did not call function {0}")]
    MissingFunctionCall(String),
}

impl From<OpenAiError> for OracleError {
    fn from(err: OpenAiError) -> Self {
        match err {
            // Includes connect errors and per-request timeouts.
            OpenAiError::Http(e) => OracleError::Transport(e.to_string()),
            OpenAiError::Api { status, message } => OracleError::Api { status, message },
            OpenAiError::Json(e) => OracleError::MalformedResponse(e.to_string()),
            OpenAiError::Malformed(message) => OracleError::MalformedResponse(message),
            OpenAiError::MissingFunctionCall(name) => {
                OracleError::MalformedResponse(format!("no call to {name}"))
            }
        }
    }
}
