mod common;

use common::{clock, RecordingRemote};
use devlogify::managers::{OfflineQueue, ReplayPolicy, Replayer, QUEUE_STORAGE_KEY};
use devlogify::store::models::{EntityKind, MutationType};
use devlogify::store::{KeyValueStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn queue(storage: &MemoryStore) -> Arc<OfflineQueue> {
    Arc::new(OfflineQueue::new(Arc::new(storage.clone()), Arc::new(clock())))
}

fn replayer(queue: &Arc<OfflineQueue>, remote: &Arc<RecordingRemote>) -> Replayer {
    Replayer::new(
        queue.clone(),
        remote.clone(),
        ReplayPolicy::no_retry(Duration::from_secs(5)),
    )
}

async fn enqueue_three(queue: &OfflineQueue) -> (String, String, String) {
    let a = queue
        .enqueue(MutationType::Create, EntityKind::Task, json!({ "id": "t1", "title": "A" }))
        .await;
    let b = queue
        .enqueue(MutationType::Update, EntityKind::Task, json!({ "id": "t1", "title": "B" }))
        .await;
    let c = queue
        .enqueue(MutationType::Delete, EntityKind::Note, json!({ "id": "n1" }))
        .await;
    (a, b, c)
}

fn ids(items: &[devlogify::store::models::OfflineQueueItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

#[tokio::test]
async fn test_enqueue_preserves_order() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);

    let (a, b, c) = enqueue_three(&queue).await;
    assert_ne!(a, b);
    assert_ne!(b, c);

    let items = queue.get_queue().await;
    assert_eq!(ids(&items), vec![a, b, c]);
    assert_eq!(items[0].mutation, MutationType::Create);
    assert_eq!(items[2].entity, EntityKind::Note);
    assert_eq!(items[1].payload["title"], "B");
}

#[tokio::test]
async fn test_partial_replay_keeps_tail_in_order() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);
    let remote = Arc::new(RecordingRemote::new());
    let (a, b, c) = enqueue_three(&queue).await;

    remote.fail_item(&b);
    let report = replayer(&queue, &remote).replay_pass().await;

    assert_eq!(report.replayed, 1);
    assert_eq!(report.remaining, 2);
    assert_eq!(report.halted_on.as_deref(), Some(b.as_str()));
    assert_eq!(ids(&queue.get_queue().await), vec![b.clone(), c.clone()]);
    assert_eq!(remote.applied(), vec![a]);
}

#[tokio::test]
async fn test_replay_halts_on_failure() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);
    let remote = Arc::new(RecordingRemote::new());
    let (a, b, c) = enqueue_three(&queue).await;

    remote.fail_item(&b);
    replayer(&queue, &remote).replay_pass().await;

    assert_eq!(remote.attempts_for(&a), 1);
    assert_eq!(remote.attempts_for(&b), 1);
    assert_eq!(remote.attempts_for(&c), 0);
}

#[tokio::test]
async fn test_next_pass_resumes_from_failed_item() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);
    let remote = Arc::new(RecordingRemote::new());
    let (a, b, c) = enqueue_three(&queue).await;
    let replayer = replayer(&queue, &remote);

    remote.fail_item(&b);
    replayer.replay_pass().await;

    remote.heal_item(&b);
    let report = replayer.replay_pass().await;

    assert_eq!(report.replayed, 2);
    assert_eq!(report.remaining, 0);
    assert_eq!(report.halted_on, None);
    assert!(queue.is_empty().await);
    assert_eq!(remote.applied(), vec![a.clone(), b, c]);
    assert_eq!(remote.attempts_for(&a), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried_within_pass() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);
    let remote = Arc::new(RecordingRemote::new());
    let (a, _, _) = enqueue_three(&queue).await;

    remote.fail_item(&a);
    let policy = ReplayPolicy {
        timeout: Duration::from_secs(5),
        max_retries: 2,
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    };
    let report = Replayer::new(queue.clone(), remote.clone(), policy)
        .replay_pass()
        .await;

    assert_eq!(report.replayed, 0);
    assert_eq!(remote.attempts_for(&a), 3);
    assert_eq!(queue.len().await, 3);
}

#[tokio::test]
async fn test_corrupted_storage_reads_as_empty() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);

    storage.set(QUEUE_STORAGE_KEY, "\u{0}garbage[").await.unwrap();
    assert!(queue.get_queue().await.is_empty());

    // Corruption is replaced by the next write rather than blocking it
    let id = queue
        .enqueue(MutationType::Create, EntityKind::Project, json!({ "name": "p" }))
        .await;
    assert_eq!(ids(&queue.get_queue().await), vec![id]);
}

#[tokio::test]
async fn test_dequeue_and_clear() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);
    let (a, b, c) = enqueue_three(&queue).await;

    assert!(queue.dequeue(&b).await);
    assert!(!queue.dequeue(&b).await);
    assert!(!queue.dequeue("missing").await);
    assert_eq!(ids(&queue.get_queue().await), vec![a, c]);

    queue.clear().await;
    assert!(queue.is_empty().await);
    assert_eq!(storage.get(QUEUE_STORAGE_KEY).await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_queue_is_read_through_storage() {
    let storage = MemoryStore::new();
    let first = queue(&storage);
    let (a, b, c) = enqueue_three(&first).await;
    drop(first);

    let second = queue(&storage);
    assert_eq!(ids(&second.get_queue().await), vec![a, b, c]);
}

#[tokio::test]
async fn test_item_ids_carry_enqueue_time() {
    let storage = MemoryStore::new();
    let queue = queue(&storage);
    let (a, _, _) = enqueue_three(&queue).await;

    let item = &queue.get_queue().await[0];
    assert!(a.starts_with(&format!("{}-", item.enqueued_at_epoch_millis)));
}
