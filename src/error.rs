use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("A timer session is already active. Stop it with: devlogify timer stop, or drop it with: devlogify timer discard")]
    TimerAlreadyActive,

    #[error("No active timer session. Start one with: devlogify timer start")]
    NoActiveTimer,

    #[error("Timer is not running")]
    TimerNotRunning,

    #[error("Timer is not paused. Resume only applies to a paused session")]
    TimerNotPaused,

    #[error("Remote request failed: {message}")]
    Remote { message: String },

    #[error("Remote returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("Remote request timed out")]
    Timeout,

    #[error("Remote is not configured. Set remote.base_url in ~/.config/devlogify/config.toml")]
    RemoteNotConfigured,

    #[error("Invalid mutation: {message}")]
    InvalidMutation { message: String },

    #[error("Queue item '{id}' not found")]
    QueueItemNotFound { id: String },

    #[error("Storage error: {0}")]
    StorageError(#[from] sqlx::Error),

    #[error("Local storage corrupted: {path}. {suggestion}")]
    StorageCorrupted { path: PathBuf, suggestion: String },

    #[error("Failed to open local storage: {path}")]
    StorageOpen { path: PathBuf, source: sqlx::Error },

    #[error("Migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

impl Error {
    /// Whether a remote failure is worth retrying within the same replay attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Remote { .. } | Error::Timeout => true,
            Error::RemoteStatus { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Remote {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(Error::Timeout.is_transient());
        assert!(Error::Remote { message: "reset".into() }.is_transient());
        assert!(Error::RemoteStatus { status: 503, body: String::new() }.is_transient());
        assert!(Error::RemoteStatus { status: 429, body: String::new() }.is_transient());
    }

    #[test]
    fn permanent_errors() {
        assert!(!Error::RemoteStatus { status: 400, body: String::new() }.is_transient());
        assert!(!Error::RemoteStatus { status: 409, body: String::new() }.is_transient());
        assert!(!Error::NoActiveTimer.is_transient());
        assert!(!Error::InvalidMutation { message: "no id".into() }.is_transient());
        assert!(!Error::ConfigError("bad".into()).is_transient());
    }
}
