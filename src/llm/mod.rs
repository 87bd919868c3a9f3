//! Remote language model boundary.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the remote model.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not set; export {0}")]
    MissingApiKey(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Model returned no text")]
    EmptyResponse,
}

/// Result type for model calls.
pub type LlmResult<T> = Result<T, LlmError>;

/// A hosted model answering one user turn under a system prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_turn: &str) -> LlmResult<String>;

    /// Identifier for logs.
    fn name(&self) -> &str;
}
