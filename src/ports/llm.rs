//! LLM client port for text generation.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed future type alias used by [`LlmClient`] to keep the trait dyn-compatible.
pub type LlmFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// A request to generate a completion from an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model identifier (e.g. `"codellama:7b"`).
    pub model: String,
    /// The prompt sent as a single user message.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
}

/// The response from an LLM completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub text: String,
    /// Number of prompt tokens consumed.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Number of completion tokens generated.
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Why a completion failed.
///
/// Serializable so recorded failures replay as the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LlmError {
    /// The request never got an HTTP response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The request took longer than the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the body itself.
        message: String,
    },
    /// The backend answered, but not with something we understand.
    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether sending the same request again might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Sends completion requests to a language model.
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (network, backend, malformed reply).
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_failures() {
        assert!(LlmError::Transport("connection refused".into()).is_retryable());
        assert!(LlmError::Timeout("120s".into()).is_retryable());
        assert!(LlmError::Status { status: 503, message: "loading".into() }.is_retryable());
        assert!(LlmError::Status { status: 429, message: "slow down".into() }.is_retryable());
        assert!(!LlmError::Status { status: 404, message: "model not found".into() }.is_retryable());
        assert!(!LlmError::InvalidResponse("no message".into()).is_retryable());
    }

    #[test]
    fn errors_survive_json() {
        let err = LlmError::Status { status: 500, message: "boom".into() };
        let json = serde_json::to_value(&err).unwrap();
        let back: LlmError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}
