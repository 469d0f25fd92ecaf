use crate::clock::Clock;
use crate::error::Result;
use crate::store::models::{EntityKind, MutationType, OfflineQueueItem};
use crate::store::KeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const QUEUE_STORAGE_KEY: &str = "devlogify.offline_queue";

/// Ordered buffer of mutations that could not reach the remote.
///
/// Reads go straight to storage so the queue survives restarts. Mutations
/// take an internal lock; each one is a full read-modify-write of the array.
pub struct OfflineQueue {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl OfflineQueue {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Fresh item stamped with the current time and a unique id
    pub fn build_item(
        &self,
        mutation: MutationType,
        entity: EntityKind,
        payload: serde_json::Value,
    ) -> OfflineQueueItem {
        let millis = self.clock.now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();

        OfflineQueueItem {
            id: format!("{}-{}", millis, &suffix[..10]),
            mutation,
            entity,
            payload,
            enqueued_at_epoch_millis: millis,
        }
    }

    /// Append a mutation and persist. Never fails: a storage failure is logged
    /// and the item is lost, the triggering write has already failed upstream.
    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        mutation: MutationType,
        entity: EntityKind,
        payload: serde_json::Value,
    ) -> String {
        let item = self.build_item(mutation, entity, payload);
        let id = item.id.clone();
        self.push(item).await;
        id
    }

    /// Append a prebuilt item, keeping its id
    pub async fn push(&self, item: OfflineQueueItem) {
        let _guard = self.write_lock.lock().await;

        let mut items = match self.load().await {
            Ok(items) => items,
            Err(e) => {
                // Writing now would overwrite whatever is stored
                warn!(error = %e, id = %item.id, "Failed to read offline queue, dropping mutation");
                return;
            }
        };

        info!(id = %item.id, mutation = %item.mutation, entity = %item.entity, "Queued offline mutation");
        items.push(item);
        self.save(&items).await;
    }

    /// Remove one item; returns whether it was queued
    #[instrument(skip(self))]
    pub async fn dequeue(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().await;

        let mut items = match self.load().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to read offline queue");
                return false;
            }
        };

        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            debug!("Item not in queue");
            return false;
        }

        self.save(&items).await;
        true
    }

    /// Queue in enqueue order. Empty when storage is missing, unreadable or corrupted.
    pub async fn get_queue(&self) -> Vec<OfflineQueueItem> {
        match self.load().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to read offline queue, treating as empty");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        self.save(&[]).await;
        info!("Offline queue cleared");
    }

    pub async fn len(&self) -> usize {
        self.get_queue().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Storage errors propagate; malformed content reads as an empty queue
    async fn load(&self) -> Result<Vec<OfflineQueueItem>> {
        let Some(raw) = self.storage.get(QUEUE_STORAGE_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(error = %e, "Offline queue storage is corrupted, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, items: &[OfflineQueueItem]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize offline queue");
                return;
            }
        };

        if let Err(e) = self.storage.set(QUEUE_STORAGE_KEY, &raw).await {
            warn!(error = %e, "Failed to persist offline queue");
        }
    }
}
