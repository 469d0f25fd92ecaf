use crate::backends::traits::{Connectivity, RemoteStore};
use crate::error::Result;
use crate::managers::queue::OfflineQueue;
use crate::store::models::{EntityKind, MutationType};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Applied { id: String },
    Queued { id: String },
}

/// Front door for create/update/delete: writes through when it can, queues
/// when it can't.
pub struct MutationDispatcher {
    remote: Arc<dyn RemoteStore>,
    queue: Arc<OfflineQueue>,
    connectivity: Arc<dyn Connectivity>,
}

impl MutationDispatcher {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        queue: Arc<OfflineQueue>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            remote,
            queue,
            connectivity,
        }
    }

    /// Mutations the remote could never apply are rejected up front instead
    /// of blocking the head of the queue.
    #[instrument(skip(self, payload))]
    pub async fn submit(
        &self,
        mutation: MutationType,
        entity: EntityKind,
        payload: serde_json::Value,
    ) -> Result<DispatchOutcome> {
        let item = self.queue.build_item(mutation, entity, payload);
        item.validate()?;
        let id = item.id.clone();

        if !self.connectivity.is_online() {
            debug!("Offline, queueing mutation");
            self.queue.push(item).await;
            return Ok(DispatchOutcome::Queued { id });
        }

        // A direct write must not overtake mutations still waiting in the queue
        if !self.queue.is_empty().await {
            debug!("Queue not drained, queueing behind it");
            self.queue.push(item).await;
            return Ok(DispatchOutcome::Queued { id });
        }

        match self.remote.apply(&item).await {
            Ok(()) => Ok(DispatchOutcome::Applied { id }),
            Err(e) => {
                warn!(error = %e, "Remote write failed, queueing mutation");
                self.queue.push(item).await;
                Ok(DispatchOutcome::Queued { id })
            }
        }
    }
}
