//! Typed API error for HTTP handlers.
//!
//! Converts service errors into JSON responses with proper status codes.
//! Handlers return `Result<T, ApiError>`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lightchat_core::InvalidSessionId;
use lightchat_service::ServiceError;

/// Converts to a JSON response: `{"error": "message"}`.
///
/// `Internal` logs the real error server-side and returns a static message.
#[derive(Debug)]
pub enum ApiError {
    /// 404: unknown, expired or malformed session id.
    NotFound(String),
    /// 409: the session is busy with another turn.
    Conflict(String),
    /// 502: the completion engine failed.
    BadGateway(String),
    /// 503: the device store is unreachable.
    ServiceUnavailable(String),
    /// 500: anything else. Details logged, not exposed.
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::BadGateway(msg) => {
                tracing::warn!(error = %msg, "upstream failure");
                (StatusCode::BAD_GATEWAY, msg)
            },
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            },
        };
        let body = serde_json::json!({"error": message});
        (status, Json(body)).into_response()
    }
}

/// An id that is not a UUID can never name a live session.
impl From<InvalidSessionId> for ApiError {
    fn from(err: InvalidSessionId) -> Self {
        Self::NotFound(format!("session not found: {}", err.0))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::SessionNotFound(_) => Self::NotFound(err.to_string()),
            ServiceError::SessionBusy(_) => Self::Conflict(err.to_string()),
            ServiceError::UpstreamFailure(_) => Self::BadGateway(err.to_string()),
            ServiceError::Storage(ref e) if e.is_transient() => {
                Self::ServiceUnavailable(err.to_string())
            },
            ServiceError::Storage(_) => Self::Internal(Box::new(err)),
        }
    }
}
