pub mod models;
pub mod queries;

use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Durable key-value storage shared by the timer and the offline queue.
/// Each component owns exactly one key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed local storage
#[derive(Clone)]
pub struct Store {
    pool: Arc<SqlitePool>,
}

impl Store {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_exists = path.exists();

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                if db_exists {
                    Error::StorageCorrupted {
                        path: path.to_path_buf(),
                        suggestion: format!(
                            "Try: mv {} {}.bak && devlogify timer status",
                            path.display(),
                            path.display()
                        ),
                    }
                } else {
                    Error::StorageOpen {
                        path: path.to_path_buf(),
                        source: e,
                    }
                }
            })?;

        Self::migrate(pool).await
    }

    /// Private in-process database, gone when the store is dropped
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        queries::get_value(self.pool(), key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        queries::set_value(self.pool(), key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        queries::remove_value(self.pool(), key).await
    }
}

/// Process-local storage for tests and ephemeral runs
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.remove(key);
        Ok(())
    }
}

fn poisoned() -> Error {
    Error::AnyhowError(anyhow::anyhow!("memory store lock poisoned"))
}

pub use models::{
    EntityKind, MutationType, NewTimeEntry, OfflineQueueItem, TimerSession, TimerStatus,
};
