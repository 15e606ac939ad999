//! Chat-completions client for any OpenAI-compatible endpoint, usable as a
//! [`yotei_core::Oracle`].
//!
//! # Example
//!
//! ```ignore
//! use yotei_core::Pipeline;
//! use yotei_openai::OpenAiClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = OpenAiClient::new("your-api-key").model("gpt-4o-mini");
//!     let pipeline = Pipeline::new(client);
//!     let output = pipeline.process("明日は塾のテスト").await.unwrap();
//! }
//! ```

mod client;
mod convert;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, OpenAiClient};
pub use convert::{build_request_body, function_arguments, parse_response};
pub use error::OpenAiError;
pub use types::{
    ChatMessage, ChatRequest, Completion, GenerationParams, Role, TokenUsage, ToolCall,
    ToolChoice, ToolDefinition,
};
