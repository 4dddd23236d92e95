//! Storage backend trait abstraction
//!
//! Key/value primitives the light repository is built on: an atomic counter,
//! JSON documents with field-scoped writes, and integer sets used as indexes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

/// Document store with a secondary-index set primitive.
///
/// Every method is a single atomic operation on the backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Increment the counter at `key` (starting from 0) and return the new value.
    async fn incr(&self, key: &str) -> Result<u64, StorageError>;

    /// Write a whole document, replacing any previous one.
    async fn put_document(&self, key: &str, doc: &Value) -> Result<(), StorageError>;

    /// Overwrite one top-level field of an existing document.
    /// Returns `false` if no document exists at `key`.
    async fn set_field(&self, key: &str, field: &str, value: &Value)
    -> Result<bool, StorageError>;

    async fn get_document(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Fetch many documents in one round trip, in `keys` order.
    async fn get_documents(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StorageError>;

    /// Returns `true` if a document was deleted.
    async fn delete_document(&self, key: &str) -> Result<bool, StorageError>;

    /// Returns `true` if `member` was not already present.
    async fn set_add(&self, set: &str, member: u64) -> Result<bool, StorageError>;

    async fn set_members(&self, set: &str) -> Result<Vec<u64>, StorageError>;

    /// Returns `true` if `member` was present.
    async fn set_remove(&self, set: &str, member: u64) -> Result<bool, StorageError>;
}
