//! In-process document store.
//!
//! Used when no database is configured and by tests. State is lost on restart.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;
use crate::traits::DocumentStore;

#[derive(Debug, Default)]
struct MemoryState {
    counters: HashMap<String, u64>,
    documents: HashMap<String, Value>,
    sets: HashMap<String, BTreeSet<u64>>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

fn lock_state<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e: PoisonError<_>| StorageError::unavailable(format!("memory store lock poisoned: {e}")))
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<u64, StorageError> {
        let mut state = lock_state(&self.state)?;
        let counter = state.counters.entry(key.to_owned()).or_insert(0);
        *counter = counter.saturating_add(1);
        Ok(*counter)
    }

    async fn put_document(&self, key: &str, doc: &Value) -> Result<(), StorageError> {
        lock_state(&self.state)?.documents.insert(key.to_owned(), doc.clone());
        Ok(())
    }

    async fn set_field(
        &self,
        key: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool, StorageError> {
        let mut state = lock_state(&self.state)?;
        let Some(doc) = state.documents.get_mut(key) else {
            return Ok(false);
        };
        let Some(object) = doc.as_object_mut() else {
            return Err(StorageError::DataCorruption {
                context: format!("document {key} is not an object"),
                source: "expected JSON object".into(),
            });
        };
        object.insert(field.to_owned(), value.clone());
        Ok(true)
    }

    async fn get_document(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(lock_state(&self.state)?.documents.get(key).cloned())
    }

    async fn get_documents(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StorageError> {
        let state = lock_state(&self.state)?;
        Ok(keys.iter().map(|k| state.documents.get(k).cloned()).collect())
    }

    async fn delete_document(&self, key: &str) -> Result<bool, StorageError> {
        Ok(lock_state(&self.state)?.documents.remove(key).is_some())
    }

    async fn set_add(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        Ok(lock_state(&self.state)?.sets.entry(set.to_owned()).or_default().insert(member))
    }

    async fn set_members(&self, set: &str) -> Result<Vec<u64>, StorageError> {
        let state = lock_state(&self.state)?;
        Ok(state.sets.get(set).map(|s| s.iter().copied().collect()).unwrap_or_default())
    }

    async fn set_remove(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        let mut state = lock_state(&self.state)?;
        Ok(state.sets.get_mut(set).is_some_and(|s| s.remove(&member)))
    }
}
