use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lightchat_core::{ALL_LIGHTS_SET_KEY, Device, light_key};
use serde_json::Value;

use super::create_test_repository;
use crate::{DeviceRepository, DocumentStore, MemoryStore, StorageError};

#[tokio::test]
async fn lamp_lifecycle_scenario() {
    let (repo, _store) = create_test_repository();

    let created = repo.create("Lamp").await.unwrap();
    assert_eq!(created, Device { id: 1, name: "Lamp".to_owned(), is_on: false, temperature: None });

    let on = repo.set_power(1, true).await.unwrap();
    assert_eq!(on, Device { id: 1, name: "Lamp".to_owned(), is_on: true, temperature: None });

    let warm = repo.set_temperature(1, Some(3000)).await.unwrap();
    assert_eq!(warm, Device { id: 1, name: "Lamp".to_owned(), is_on: true, temperature: Some(3000) });

    assert!(repo.delete(1).await.unwrap());
    assert_eq!(repo.get(1).await.unwrap(), None);
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn ids_are_never_reused_after_deleting_the_highest() {
    let (repo, _store) = create_test_repository();
    let a = repo.create("a").await.unwrap();
    let b = repo.create("b").await.unwrap();
    assert!(b.id > a.id);

    assert!(repo.delete(b.id).await.unwrap());
    let c = repo.create("c").await.unwrap();
    assert!(c.id > b.id, "id {} reused after deleting {}", c.id, b.id);
}

#[tokio::test]
async fn set_power_preserves_temperature() {
    let (repo, _store) = create_test_repository();
    let light = repo.create("Desk").await.unwrap();

    repo.set_temperature(light.id, Some(6500)).await.unwrap();
    let after = repo.set_power(light.id, true).await.unwrap();

    assert_eq!(after.temperature, Some(6500));
    assert!(after.is_on);
    assert_eq!(after.name, "Desk");
}

#[tokio::test]
async fn clearing_temperature_stores_sentinel() {
    let (repo, store) = create_test_repository();
    let light = repo.create("Hall").await.unwrap();
    repo.set_temperature(light.id, Some(2700)).await.unwrap();

    let cleared = repo.set_temperature(light.id, None).await.unwrap();
    assert_eq!(cleared.temperature, None);

    let raw = store.get_document(&light_key(light.id)).await.unwrap().unwrap();
    assert_eq!(raw["temperature"], 0);
}

#[tokio::test]
async fn out_of_range_temperature_is_rejected_without_write() {
    let (repo, _store) = create_test_repository();
    let light = repo.create("Porch").await.unwrap();

    let err = repo.set_temperature(light.id, Some(500)).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidTemperature(500)));
    let err = repo.set_temperature(light.id, Some(30_000)).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidTemperature(30_000)));

    assert_eq!(repo.get(light.id).await.unwrap().unwrap().temperature, None);
}

#[tokio::test]
async fn field_update_on_unknown_light_is_not_found() {
    let (repo, _store) = create_test_repository();
    let err = repo.set_power(42, true).await.unwrap_err();
    assert!(matches!(err, StorageError::DeviceNotFound { id: 42 }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_tolerates_index_entry_without_document() {
    let (repo, store) = create_test_repository();
    let kept = repo.create("kept").await.unwrap();
    let orphan = repo.create("orphan").await.unwrap();

    // Simulates a crash between index removal and document deletion, in reverse.
    store.delete_document(&light_key(orphan.id)).await.unwrap();

    let lights = repo.list().await.unwrap();
    assert_eq!(lights, vec![kept]);
}

#[tokio::test]
async fn list_skips_corrupt_documents() {
    let (repo, store) = create_test_repository();
    let good = repo.create("good").await.unwrap();
    store.set_add(ALL_LIGHTS_SET_KEY, 99).await.unwrap();
    store.put_document(&light_key(99), &serde_json::json!("not an object")).await.unwrap();

    assert_eq!(repo.list().await.unwrap(), vec![good]);
}

#[tokio::test]
async fn delete_of_unknown_light_returns_false() {
    let (repo, _store) = create_test_repository();
    assert!(!repo.delete(7).await.unwrap());
}

#[tokio::test]
async fn delete_removes_index_entry() {
    let (repo, store) = create_test_repository();
    let light = repo.create("gone").await.unwrap();
    repo.delete(light.id).await.unwrap();
    assert!(store.set_members(ALL_LIGHTS_SET_KEY).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_allocate_distinct_ids() {
    let repo = DeviceRepository::new(Arc::new(MemoryStore::new()));
    let mut handles = Vec::new();
    for i in 0..32 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move { repo.create(&format!("light-{i}")).await }));
    }
    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().id);
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(repo.list().await.unwrap().len(), 32);
}

/// Memory store that counts document reads.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    single_reads: AtomicUsize,
    batch_reads: AtomicUsize,
}

impl CountingStore {
    fn reads(&self) -> (usize, usize) {
        (self.single_reads.load(Ordering::SeqCst), self.batch_reads.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn incr(&self, key: &str) -> Result<u64, StorageError> {
        self.inner.incr(key).await
    }

    async fn put_document(&self, key: &str, doc: &Value) -> Result<(), StorageError> {
        self.inner.put_document(key, doc).await
    }

    async fn set_field(&self, key: &str, field: &str, value: &Value) -> Result<bool, StorageError> {
        self.inner.set_field(key, field, value).await
    }

    async fn get_document(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.single_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_document(key).await
    }

    async fn get_documents(&self, keys: &[String]) -> Result<Vec<Option<Value>>, StorageError> {
        self.batch_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_documents(keys).await
    }

    async fn delete_document(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.delete_document(key).await
    }

    async fn set_add(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        self.inner.set_add(set, member).await
    }

    async fn set_members(&self, set: &str) -> Result<Vec<u64>, StorageError> {
        self.inner.set_members(set).await
    }

    async fn set_remove(&self, set: &str, member: u64) -> Result<bool, StorageError> {
        self.inner.set_remove(set, member).await
    }
}

#[tokio::test]
async fn list_fetches_all_documents_in_one_batch() {
    let store = Arc::new(CountingStore::default());
    let repo = DeviceRepository::new(Arc::clone(&store));
    for name in ["a", "b", "c"] {
        repo.create(name).await.unwrap();
    }

    let lights = repo.list().await.unwrap();

    assert_eq!(lights.len(), 3);
    assert_eq!(store.reads(), (0, 1));
}

#[tokio::test]
async fn list_with_empty_index_reads_no_documents() {
    let store = Arc::new(CountingStore::default());
    let repo = DeviceRepository::new(Arc::clone(&store));

    assert!(repo.list().await.unwrap().is_empty());
    assert_eq!(store.reads(), (0, 0));
}
