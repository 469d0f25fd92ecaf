use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_remote")]
    pub remote: RemoteConfig,

    #[serde(default = "default_timer")]
    pub timer: TimerConfig,

    #[serde(default = "default_sync")]
    pub sync: SyncConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            remote: default_remote(),
            timer: default_timer(),
            sync: default_sync(),
            logging: default_logging(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local storage database file. Defaults to local.db in the config directory
    #[serde(default)]
    pub path: Option<String>,
}

fn default_storage() -> StorageConfig {
    StorageConfig { path: None }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the hosted backend, e.g. https://xyz.example.co
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key; DEVLOGIFY_API_KEY takes precedence when set
    #[serde(default)]
    pub api_key: Option<String>,

    /// User the committed time entries belong to
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_remote() -> RemoteConfig {
    RemoteConfig {
        base_url: None,
        api_key: None,
        user_id: None,
        request_timeout_secs: default_request_timeout_secs(),
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Display refresh interval. Elapsed time never depends on it
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_timer() -> TimerConfig {
    TimerConfig {
        tick_interval_ms: default_tick_interval_ms(),
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often the connectivity monitor pings the remote
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,

    /// Upper bound for a single replay attempt
    #[serde(default = "default_replay_timeout_secs")]
    pub replay_timeout_secs: u64,

    /// Retries of a transient failure before the replay pass halts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_min_backoff_ms")]
    pub min_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_sync() -> SyncConfig {
    SyncConfig {
        probe_interval_secs: default_probe_interval_secs(),
        replay_timeout_secs: default_replay_timeout_secs(),
        max_retries: default_max_retries(),
        min_backoff_ms: default_min_backoff_ms(),
        max_backoff_ms: default_max_backoff_ms(),
    }
}

fn default_probe_interval_secs() -> u64 {
    15
}

fn default_replay_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_min_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the daily log files. Defaults to logs/ in the config directory
    #[serde(default)]
    pub dir: Option<String>,

    /// Filter directive for the file layer, e.g. "debug" or "devlogify=trace"
    #[serde(default = "default_file_filter")]
    pub file_filter: String,
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        dir: None,
        file_filter: default_file_filter(),
    }
}

fn default_file_filter() -> String {
    "debug".to_string()
}

impl Config {
    /// Check value ranges and the remote URL
    pub fn validate(&self) -> Result<(), String> {
        if let Some(base_url) = &self.remote.base_url {
            let parsed = url::Url::parse(base_url)
                .map_err(|e| format!("Invalid remote.base_url '{}': {}", base_url, e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!(
                    "Invalid remote.base_url '{}': scheme must be http or https",
                    base_url
                ));
            }
        }

        if self.remote.request_timeout_secs == 0 {
            return Err("remote.request_timeout_secs must be greater than zero".to_string());
        }

        if self.timer.tick_interval_ms < 50 {
            return Err(format!(
                "timer.tick_interval_ms must be at least 50, got {}",
                self.timer.tick_interval_ms
            ));
        }

        if self.sync.probe_interval_secs == 0 {
            return Err("sync.probe_interval_secs must be greater than zero".to_string());
        }

        if self.sync.replay_timeout_secs == 0 {
            return Err("sync.replay_timeout_secs must be greater than zero".to_string());
        }

        if self.sync.min_backoff_ms > self.sync.max_backoff_ms {
            return Err(format!(
                "sync.min_backoff_ms ({}) must not exceed sync.max_backoff_ms ({})",
                self.sync.min_backoff_ms, self.sync.max_backoff_ms
            ));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.file_filter).is_err() {
            return Err(format!(
                "Invalid logging.file_filter '{}'",
                self.logging.file_filter
            ));
        }

        Ok(())
    }

    /// Local storage path, resolved against the config directory
    pub fn storage_path(&self) -> anyhow::Result<PathBuf> {
        Ok(self.storage_path_in(&super::config_dir()?))
    }

    /// `~/` expands to the home directory; other relative paths are taken
    /// relative to `base`.
    pub fn storage_path_in(&self, base: &Path) -> PathBuf {
        match &self.storage.path {
            Some(path) => resolve_path(path, base),
            None => base.join("local.db"),
        }
    }

    pub fn log_dir(&self) -> anyhow::Result<PathBuf> {
        Ok(self.log_dir_in(&super::config_dir()?))
    }

    pub fn log_dir_in(&self, base: &Path) -> PathBuf {
        match &self.logging.dir {
            Some(dir) => resolve_path(dir, base),
            None => base.join("logs"),
        }
    }

    /// API key from DEVLOGIFY_API_KEY, falling back to the config file
    pub fn api_key(&self) -> Option<String> {
        std::env::var("DEVLOGIFY_API_KEY")
            .ok()
            .or_else(|| self.remote.api_key.clone())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timer.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.sync.probe_interval_secs)
    }

    pub fn replay_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.replay_timeout_secs)
    }
}

fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(raw);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
