use crate::backends::traits::{create_remote, Connectivity, RemoteStore};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::managers::{MutationDispatcher, OfflineQueue, ReplayPolicy, Replayer, TimerEngine};
use crate::store::{KeyValueStore, Store};
use std::sync::Arc;
use tracing::debug;

/// Application root: owns the collaborators and hands them to the timer and
/// queue. Built once per process and passed down explicitly.
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub remote: Option<Arc<dyn RemoteStore>>,
    pub timer: Arc<TimerEngine>,
    pub queue: Arc<OfflineQueue>,
}

impl AppContext {
    /// Open on-disk storage and the configured remote, then rehydrate the timer
    pub async fn open(config: Config) -> Result<Self> {
        let path = config.storage_path()?;
        debug!(path = %path.display(), "Opening local storage");
        let store = Store::open(&path).await?;

        let remote = match create_remote(&config) {
            Ok(remote) => Some(remote),
            Err(Error::RemoteNotConfigured) => None,
            Err(e) => return Err(e),
        };

        let ctx = Self::with_parts(config, Arc::new(store), Arc::new(SystemClock), remote);
        ctx.timer.load_from_storage().await;
        Ok(ctx)
    }

    /// Assemble from explicit collaborators. The timer is not rehydrated.
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        let mut timer = TimerEngine::new(storage.clone(), clock.clone(), config.tick_interval());
        if let Some(remote) = &remote {
            timer = timer.with_remote(remote.clone());
        }
        let queue = OfflineQueue::new(storage.clone(), clock.clone());

        Self {
            config,
            storage,
            clock,
            remote,
            timer: Arc::new(timer),
            queue: Arc::new(queue),
        }
    }

    pub fn require_remote(&self) -> Result<Arc<dyn RemoteStore>> {
        self.remote.clone().ok_or(Error::RemoteNotConfigured)
    }

    pub fn replayer(&self) -> Result<Replayer> {
        Ok(Replayer::new(
            self.queue.clone(),
            self.require_remote()?,
            ReplayPolicy::from_config(&self.config),
        ))
    }

    pub fn dispatcher(&self, connectivity: Arc<dyn Connectivity>) -> Result<MutationDispatcher> {
        Ok(MutationDispatcher::new(
            self.require_remote()?,
            self.queue.clone(),
            connectivity,
        ))
    }

    /// User id for committed time entries
    pub fn user_id(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .or_else(|| self.config.remote.user_id.clone())
            .ok_or_else(|| {
                Error::ConfigError(
                    "No user id. Pass --user-id or set remote.user_id in config.toml".to_string(),
                )
            })
    }
}
