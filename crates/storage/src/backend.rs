//! Unified storage backend with enum dispatch.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::memory::MemoryStore;
use crate::traits::DocumentStore;

macro_rules! dispatch {
    ($self:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            StorageBackend::Memory(s) => <MemoryStore as DocumentStore>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_store::PgStore as DocumentStore>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    Memory(MemoryStore),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_store::PgStore),
}

impl StorageBackend {
    #[must_use]
    pub fn new_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_store::PgStore::new(database_url).await?))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

#[async_trait]
impl DocumentStore for StorageBackend {
    async fn incr(&self, key: &str) -> Result<u64, StorageError> {
        dispatch!(self, incr(key))
    }

    async fn put_document(&self, key: &str, doc: &Value) -> Result<(), StorageError> {
        dispatch!(self, put_document(key, doc))
    }

    async fn set_field(
        &self,
        key: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, StorageError> {
        dispatch!(self, set_field(key, field, value))
    }

    async fn get_document(&self, key: &str) -> Result<Option<Value>, StorageError> {
        dispatch!(self, get_document(key))
    }

    async fn get_documents(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StorageError> {
        dispatch!(self, get_documents(keys))
    }

    async fn delete_document(&self, key: &str) -> Result<bool, StorageError> {
        dispatch!(self, delete_document(key))
    }

    async fn set_add(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        dispatch!(self, set_add(set, member))
    }

    async fn set_members(&self, set: &str) -> Result<Vec<u64>, StorageError> {
        dispatch!(self, set_members(set))
    }

    async fn set_remove(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        dispatch!(self, set_remove(set, member))
    }
}
