use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::models::{NewTimeEntry, OfflineQueueItem};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// The remote system of record. Every call either fully succeeds or fails;
/// there is no partial success.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Commit a finished timer session
    async fn insert_time_entry(&self, entry: &NewTimeEntry) -> Result<()>;

    /// Apply a buffered create/update/delete
    async fn apply(&self, item: &OfflineQueueItem) -> Result<()>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<()>;
}

/// Online/offline signal, readable on demand and observable.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;

    /// Receiver of the online flag. Dropping it unsubscribes.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Build the configured remote
pub fn create_remote(config: &Config) -> Result<Arc<dyn RemoteStore>> {
    let base_url = config
        .remote
        .base_url
        .as_deref()
        .ok_or(Error::RemoteNotConfigured)?;

    let remote = crate::backends::rest::RestRemote::new(
        base_url,
        config.api_key(),
        config.request_timeout(),
    )?;

    Ok(Arc::new(remote))
}
