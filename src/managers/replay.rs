use crate::backends::traits::{Connectivity, RemoteStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::managers::queue::OfflineQueue;
use crate::store::models::OfflineQueueItem;
use backon::{ExponentialBuilder, Retryable};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Timeout and retry bounds for a single replay attempt
#[derive(Debug, Clone, Copy)]
pub struct ReplayPolicy {
    pub timeout: Duration,
    pub max_retries: usize,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReplayPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.replay_timeout(),
            max_retries: config.sync.max_retries,
            min_backoff: Duration::from_millis(config.sync.min_backoff_ms),
            max_backoff: Duration::from_millis(config.sync.max_backoff_ms),
        }
    }

    /// One attempt per item, halt on the first failure
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub replayed: usize,
    pub remaining: usize,
    /// Item the pass stopped at, if any failed
    pub halted_on: Option<String>,
}

/// Drains the offline queue against the remote, head first.
pub struct Replayer {
    queue: Arc<OfflineQueue>,
    remote: Arc<dyn RemoteStore>,
    policy: ReplayPolicy,
    pass_lock: Mutex<()>,
}

impl Replayer {
    pub fn new(queue: Arc<OfflineQueue>, remote: Arc<dyn RemoteStore>, policy: ReplayPolicy) -> Self {
        Self {
            queue,
            remote,
            policy,
            pass_lock: Mutex::new(()),
        }
    }

    /// One sequential pass. Each success is dequeued before the next item is
    /// tried; the first failure ends the pass and leaves the tail queued.
    #[instrument(skip(self))]
    pub async fn replay_pass(&self) -> ReplayReport {
        let _pass = self.pass_lock.lock().await;

        let items = self.queue.get_queue().await;
        let total = items.len();
        let mut report = ReplayReport {
            remaining: total,
            ..ReplayReport::default()
        };

        if total == 0 {
            debug!("Offline queue is empty");
            return report;
        }

        info!(count = total, "Replaying offline queue");

        for item in items {
            match self.attempt(&item).await {
                Ok(()) => {
                    self.queue.dequeue(&item.id).await;
                    report.replayed += 1;
                    report.remaining -= 1;
                }
                Err(e) => {
                    warn!(id = %item.id, error = %e, "Replay halted");
                    report.halted_on = Some(item.id);
                    break;
                }
            }
        }

        info!(replayed = report.replayed, remaining = report.remaining, "Replay pass finished");
        report
    }

    async fn attempt(&self, item: &OfflineQueueItem) -> Result<()> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.policy.min_backoff)
            .with_max_delay(self.policy.max_backoff)
            .with_max_times(self.policy.max_retries)
            .with_jitter();

        (|| async { self.attempt_once(item).await })
            .retry(backoff)
            .when(|e: &Error| e.is_transient())
            .notify(|e: &Error, dur: Duration| {
                warn!(
                    id = %item.id,
                    "Replay attempt failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn attempt_once(&self, item: &OfflineQueueItem) -> Result<()> {
        tokio::time::timeout(self.policy.timeout, self.remote.apply(item))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

/// Runs a replay pass on every offline -> online transition. The task is
/// aborted when the worker is dropped.
pub struct ReplayWorker {
    handle: JoinHandle<()>,
}

impl ReplayWorker {
    pub fn spawn(replayer: Arc<Replayer>, connectivity: &dyn Connectivity) -> Self {
        let mut rx = connectivity.subscribe();

        let handle = tokio::spawn(async move {
            let mut was_online = *rx.borrow_and_update();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online && !was_online {
                    replayer.replay_pass().await;
                }
                was_online = online;
            }
            debug!("Connectivity source closed, replay worker exiting");
        });

        Self { handle }
    }
}

impl Drop for ReplayWorker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
