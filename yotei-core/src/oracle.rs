use std::future::Future;

use serde_json::Value;

use crate::error::OracleError;

/// A function the oracle is forced to call, described by a JSON Schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// External text-understanding service.
///
/// Implementations must report network and service failures as
/// [`OracleError::Transport`] or [`OracleError::Api`], never as an empty answer.
pub trait Oracle {
    /// Free-text completion. `prompt` is sent as the system message.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, OracleError>> + Send;

    /// Schema-constrained call. `prompt` is sent as the user message and the
    /// service is forced to call `function`; the call's arguments come back
    /// as JSON. No call, or arguments that are not JSON, is
    /// [`OracleError::MalformedResponse`].
    fn call_function(
        &self,
        prompt: &str,
        function: &FunctionSchema,
    ) -> impl Future<Output = Result<Value, OracleError>> + Send;
}
