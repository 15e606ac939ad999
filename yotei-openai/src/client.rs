use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};
use yotei_core::{FunctionSchema, Oracle, OracleError};

use crate::convert::{build_request_body, function_arguments, parse_response};
use crate::error::OpenAiError;
use crate::types::{
    ChatMessage, ChatRequest, Completion, GenerationParams, ToolChoice, ToolDefinition,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `error.message` of a JSON error body, or the raw body when it is not one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Client for an OpenAI-compatible chat-completions API.
///
/// Holds only read-only configuration and a pooled HTTP client, so it can
/// be shared between concurrent requests.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    params: Option<GenerationParams>,
}

impl OpenAiClient {
    /// Creates a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            params: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Per-request timeout; expiry is reported as a transport failure.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    fn request(&self, message: ChatMessage) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![message],
            params: self.params.clone(),
            tools: vec![],
            tool_choice: None,
        }
    }

    /// Executes a completion request.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<Completion, OpenAiError> {
        let body = build_request_body(request);

        debug!("Sending chat completion request");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let response_body: Value = serde_json::from_str(&text)?;
        let completion = parse_response(&response_body)?;
        debug!(
            model = ?completion.model,
            finish_reason = ?completion.finish_reason,
            input_tokens = ?completion.usage.and_then(|u| u.input_tokens),
            output_tokens = ?completion.usage.and_then(|u| u.output_tokens),
            "Received successful response"
        );

        Ok(completion)
    }

    /// Sends `prompt` as a system message and returns the answer text.
    pub async fn complete_text(&self, prompt: &str) -> Result<String, OpenAiError> {
        let completion = self.complete(&self.request(ChatMessage::system(prompt))).await?;
        completion
            .text
            .ok_or_else(|| OpenAiError::Malformed("No content in message".to_string()))
    }

    /// Sends `prompt` as a user message, forcing a call to `function`, and
    /// returns the call's parsed arguments.
    pub async fn force_function(
        &self,
        prompt: &str,
        function: &FunctionSchema,
    ) -> Result<Value, OpenAiError> {
        let mut request = self.request(ChatMessage::user(prompt));
        request.tools = vec![ToolDefinition {
            name: function.name.clone(),
            description: Some(function.description.clone()),
            parameters: function.parameters.clone(),
        }];
        request.tool_choice = Some(ToolChoice::Specific {
            name: function.name.clone(),
        });

        let completion = self.complete(&request).await?;
        function_arguments(&completion, &function.name)
    }
}

impl Oracle for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        Ok(self.complete_text(prompt).await?)
    }

    async fn call_function(
        &self,
        prompt: &str,
        function: &FunctionSchema,
    ) -> Result<Value, OracleError> {
        Ok(self.force_function(prompt, function).await?)
    }
}
