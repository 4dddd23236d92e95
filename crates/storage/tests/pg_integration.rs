//! Integration tests for PgStore.
//! Run with: DATABASE_URL=... cargo test -p lightchat-storage -- --ignored pg_

#![cfg(feature = "postgres")]
#![allow(clippy::unwrap_used, reason = "integration test code")]

use std::sync::Arc;

use lightchat_storage::{DeviceRepository, DocumentStore, PgStore};
use serde_json::json;

async fn create_pg_store() -> PgStore {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for PgStore integration tests");
    PgStore::new(&url).await.expect("Failed to connect to PostgreSQL")
}

fn unique_key(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test:{prefix}:{nanos}")
}

#[tokio::test]
#[ignore]
async fn pg_incr_is_monotonic() {
    let store = create_pg_store().await;
    let key = unique_key("counter");
    assert_eq!(store.incr(&key).await.unwrap(), 1);
    assert_eq!(store.incr(&key).await.unwrap(), 2);
}

#[tokio::test]
#[ignore]
async fn pg_set_field_is_field_scoped() {
    let store = create_pg_store().await;
    let key = unique_key("doc");
    store.put_document(&key, &json!({"is_on": false, "temperature": 2700})).await.unwrap();

    assert!(store.set_field(&key, "is_on", &json!(true)).await.unwrap());
    let doc = store.get_document(&key).await.unwrap().unwrap();
    assert_eq!(doc, json!({"is_on": true, "temperature": 2700}));

    assert!(!store.set_field(&unique_key("missing"), "is_on", &json!(true)).await.unwrap());
    assert!(store.delete_document(&key).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn pg_get_documents_single_round_trip_keeps_order() {
    let store = create_pg_store().await;
    let a = unique_key("a");
    let b = unique_key("b");
    store.put_document(&a, &json!({"n": 1})).await.unwrap();

    let docs = store.get_documents(&[b.clone(), a.clone()]).await.unwrap();
    assert_eq!(docs, vec![None, Some(json!({"n": 1}))]);
    store.delete_document(&a).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn pg_repository_round_trip() {
    let repo = DeviceRepository::new(Arc::new(create_pg_store().await));
    let light = repo.create("pg lamp").await.unwrap();
    let updated = repo.set_temperature(light.id, Some(4000)).await.unwrap();
    assert_eq!(updated.temperature, Some(4000));
    let updated = repo.set_power(light.id, true).await.unwrap();
    assert_eq!(updated.temperature, Some(4000));
    assert!(repo.list().await.unwrap().iter().any(|l| l.id == light.id));
    assert!(repo.delete(light.id).await.unwrap());
    assert_eq!(repo.get(light.id).await.unwrap(), None);
}
