use crate::backends::traits::{Connectivity, RemoteStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Connectivity flag driven explicitly by its owner
#[derive(Debug, Clone)]
pub struct ManualConnectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a new state; subscribers only wake on an actual transition
    pub fn set_online(&self, online: bool) {
        publish(&self.tx, online);
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Pings the remote on an interval and publishes online/offline transitions.
/// The probe task is aborted when the monitor is dropped.
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
    probe: JoinHandle<()>,
}

impl ConnectivityMonitor {
    pub fn spawn(remote: Arc<dyn RemoteStore>, interval: Duration) -> Self {
        // Assume offline until the first probe answers
        let (tx, _rx) = watch::channel(false);
        let tx = Arc::new(tx);

        let probe = tokio::spawn({
            let tx = tx.clone();
            async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    let online = match remote.ping().await {
                        Ok(()) => true,
                        Err(e) => {
                            debug!(error = %e, "Connectivity probe failed");
                            false
                        }
                    };
                    publish(&tx, online);
                }
            }
        });

        Self { tx, probe }
    }
}

impl Connectivity for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.probe.abort();
    }
}

fn publish(tx: &watch::Sender<bool>, online: bool) {
    let changed = tx.send_if_modified(|current| {
        if *current == online {
            false
        } else {
            *current = online;
            true
        }
    });

    if changed {
        if online {
            info!("Connectivity restored");
        } else {
            warn!("Connectivity lost");
        }
    }
}
