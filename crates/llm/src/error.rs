//! Typed error enum for the LLM crate.

use thiserror::Error;

/// Errors from completion engine operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("engine reported an error: {0}")]
    Upstream(String),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
    #[error("tool loop exceeded {0} rounds")]
    ToolLoopExceeded(usize),
}

impl LlmError {
    /// Whether this error is transient and might succeed on a later turn.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 529),
            _ => false,
        }
    }
}
