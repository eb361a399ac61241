//! Language-model adapter seam

use async_trait::async_trait;
use thiserror::Error;

/// Failures of a single adapter call
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Adapter call timed out after {0}s")]
    Timeout(u64),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        AdapterError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(e: serde_json::Error) -> Self {
        AdapterError::Malformed(e.to_string())
    }
}

/// A chat-style language model: one system prompt, one user prompt, one
/// free-text reply
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn summarize_batch(&self, system: &str, user: &str) -> Result<String, AdapterError>;
}
