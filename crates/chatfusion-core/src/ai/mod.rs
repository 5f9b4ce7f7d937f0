pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Coarse failure category, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Rejected,
    Malformed,
    Empty,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured; set GEMINI_API_KEY")]
    MissingKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response contained no text")]
    Empty,
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompletionError::Transport(_) => FailureKind::Transport,
            CompletionError::MissingKey => FailureKind::Rejected,
            CompletionError::Rejected { .. } => FailureKind::Rejected,
            CompletionError::Malformed(_) => FailureKind::Malformed,
            CompletionError::Empty => FailureKind::Empty,
        }
    }
}

/// A single prompt-in, text-out round trip to a hosted model.
///
/// Implementations perform exactly one attempt; retrying is left to callers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Model identifier, for display.
    fn model(&self) -> &str;
}
