mod common;

use common::clock;
use devlogify::clock::Clock;
use devlogify::managers::{OfflineQueue, TimerEngine, QUEUE_STORAGE_KEY, TIMER_STORAGE_KEY};
use devlogify::store::models::{EntityKind, MutationType, TimerStatus};
use devlogify::store::{KeyValueStore, Store};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_store_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("local.db");

    let store = Store::open(&db_path).await.unwrap();
    assert!(db_path.exists());
    assert_eq!(store.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_set_overwrites_and_remove_deletes() {
    let store = Store::open_in_memory().await.unwrap();

    store.set("k", "one").await.unwrap();
    store.set("k", "two").await.unwrap();
    store.set("other", "x").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
    assert_eq!(store.get("other").await.unwrap().as_deref(), Some("x"));

    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
    store.remove("k").await.unwrap();
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("local.db");
    let clock = clock();

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(Store::open(&db_path).await.unwrap());
        let timer = TimerEngine::new(store.clone(), Arc::new(clock.clone()), Duration::from_secs(1));
        timer.start(Some("t1".into()), None).await.unwrap();

        let queue = OfflineQueue::new(store, Arc::new(clock.clone()));
        queue.enqueue(MutationType::Create, EntityKind::Task, json!({ "title": "A" })).await;
    }

    clock.advance_secs(61);

    let store: Arc<dyn KeyValueStore> = Arc::new(Store::open(&db_path).await.unwrap());
    let timer = TimerEngine::new(store.clone(), Arc::new(clock.clone()), Duration::from_secs(1));
    assert_eq!(timer.load_from_storage().await, TimerStatus::Running);
    assert_eq!(timer.elapsed_seconds().await, 61);

    let queue = OfflineQueue::new(store.clone(), Arc::new(clock.clone()));
    let items = queue.get_queue().await;
    assert_eq!(items.len(), 1);
    assert!(items[0].enqueued_at_epoch_millis < clock.now().timestamp_millis());

    // Each component owns its own key
    assert!(store.get(TIMER_STORAGE_KEY).await.unwrap().is_some());
    assert!(store.get(QUEUE_STORAGE_KEY).await.unwrap().is_some());
}
