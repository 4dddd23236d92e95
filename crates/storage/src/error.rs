//! Typed error enum for the storage layer.
//!
//! Lets callers match on specific failure modes (unknown light, unreachable
//! backend, rejected value) instead of downcasting opaque boxes.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing store could not be reached (connection, pool timeout, I/O).
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Field update targeted a light with no document.
    #[error("light {id} not found")]
    DeviceNotFound { id: u64 },

    /// Temperature outside the accepted Kelvin range.
    #[error("temperature {0} is outside 1000..=27000")]
    InvalidTemperature(i64),

    /// Backend rejected a statement for a reason other than connectivity.
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Stored document could not be deserialized into a domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }

    pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        Self::StoreUnavailable(msg.into())
    }
}

/// Custom `From<sqlx::Error>`, not a blanket `#[from]`.
///
/// - connection-level failures → `StoreUnavailable`
/// - everything else → `Database`
#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Protocol(_) => Self::StoreUnavailable(Box::new(err)),
            other => Self::Database(Box::new(other)),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption {
            context: "JSON serialization/deserialization".to_owned(),
            source: Box::new(err),
        }
    }
}
