use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Prefix of the daily log files; the appender appends `.YYYY-MM-DD`
pub const LOG_FILE_PREFIX: &str = "devlogify.log";

/// Install the global subscriber.
///
/// The file layer always writes to the configured log directory. The stderr
/// layer is added with `--verbose` or when DEVLOGIFY_LOG is set.
pub fn init(config: &Config, verbose: bool) -> Result<()> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_filter = EnvFilter::try_new(&config.logging.file_filter)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    let file_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(file_filter);

    let terminal_layer = (verbose || std::env::var("DEVLOGIFY_LOG").is_ok()).then(|| {
        let filter =
            EnvFilter::try_from_env("DEVLOGIFY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });

    // Option<Layer> is itself a layer, so a missing terminal layer is a no-op
    tracing_subscriber::registry()
        .with(file_layer)
        .with(terminal_layer)
        .init();

    Ok(())
}

/// Log file written on `date` (YYYY-MM-DD)
pub fn log_file_for(log_dir: &Path, date: &str) -> std::path::PathBuf {
    log_dir.join(format!("{}.{}", LOG_FILE_PREFIX, date))
}
