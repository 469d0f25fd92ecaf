pub mod schema;

pub use schema::Config;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable the `--config-dir` flag is forwarded through
pub const CONFIG_DIR_ENV: &str = "DEVLOGIFY_CONFIG_DIR_OVERRIDE";

/// Load config.toml from the config directory, or defaults when it doesn't exist
pub fn load() -> Result<Config> {
    load_from(&config_path()?)
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join("devlogify"))
        .context("Could not determine config directory")
}

/// Write `config` to `path`, creating parent directories as needed
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config to TOML")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}

/// Create config.toml with default values unless it already exists.
/// Returns whether a file was written.
pub fn save_default() -> Result<bool> {
    let path = config_path()?;
    if path.exists() {
        return Ok(false);
    }
    save_to(&Config::default(), &path)?;
    Ok(true)
}
