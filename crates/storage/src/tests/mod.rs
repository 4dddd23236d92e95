//! Test utilities and module declarations for storage tests.

use std::sync::Arc;

use crate::{DeviceRepository, MemoryStore, StorageBackend};

/// Repository over a fresh memory backend, plus a handle on the raw store
/// for simulating drift between the index and the documents.
pub fn create_test_repository() -> (DeviceRepository, MemoryStore) {
    let store = MemoryStore::new();
    let repo = DeviceRepository::new(Arc::new(StorageBackend::Memory(store.clone())));
    (repo, store)
}

mod device_tests;
mod memory_tests;
