use serde_json::json;

use crate::{DocumentStore, MemoryStore};

#[tokio::test]
async fn incr_starts_at_one_and_is_per_key() {
    let store = MemoryStore::new();
    assert_eq!(store.incr("a").await.unwrap(), 1);
    assert_eq!(store.incr("a").await.unwrap(), 2);
    assert_eq!(store.incr("b").await.unwrap(), 1);
}

#[tokio::test]
async fn set_field_touches_only_that_field() {
    let store = MemoryStore::new();
    store.put_document("doc", &json!({"a": 1, "b": 2})).await.unwrap();

    assert!(store.set_field("doc", "b", &json!(3)).await.unwrap());
    assert_eq!(store.get_document("doc").await.unwrap(), Some(json!({"a": 1, "b": 3})));
}

#[tokio::test]
async fn set_field_on_missing_document_reports_false() {
    let store = MemoryStore::new();
    assert!(!store.set_field("missing", "a", &json!(1)).await.unwrap());
    assert_eq!(store.get_document("missing").await.unwrap(), None);
}

#[tokio::test]
async fn get_documents_preserves_key_order_and_gaps() {
    let store = MemoryStore::new();
    store.put_document("x", &json!(1)).await.unwrap();
    store.put_document("z", &json!(3)).await.unwrap();

    let keys = vec!["z".to_owned(), "y".to_owned(), "x".to_owned()];
    let docs = store.get_documents(&keys).await.unwrap();
    assert_eq!(docs, vec![Some(json!(3)), None, Some(json!(1))]);
}

#[tokio::test]
async fn set_primitives_report_membership_changes() {
    let store = MemoryStore::new();
    assert!(store.set_add("s", 2).await.unwrap());
    assert!(!store.set_add("s", 2).await.unwrap());
    assert!(store.set_add("s", 1).await.unwrap());
    assert_eq!(store.set_members("s").await.unwrap(), vec![1, 2]);

    assert!(store.set_remove("s", 2).await.unwrap());
    assert!(!store.set_remove("s", 2).await.unwrap());
    assert!(!store.set_remove("other", 1).await.unwrap());
    assert_eq!(store.set_members("s").await.unwrap(), vec![1]);
}
