//! Typed error enum for the service layer.
//!
//! Callers match on the failure mode (unknown session, busy session,
//! engine failure, store failure) instead of inspecting message text.

use lightchat_core::SessionId;
use lightchat_llm::LlmError;
use lightchat_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No live session with this id (never created, or expired).
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Another turn is already running on this session.
    #[error("session {0} is busy with another turn")]
    SessionBusy(SessionId),

    /// The completion engine failed mid-turn.
    #[error("upstream: {0}")]
    UpstreamFailure(#[from] LlmError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_))
    }
}
