use crate::config;
use crate::error::{Error, Result};
use anyhow::Context;
use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

/// Get the user's preferred editor from environment variables
/// Priority: VISUAL > EDITOR > vi
fn get_editor() -> String {
    std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string())
}

/// Compute SHA256 hash of a file
fn hash_file(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;

    Ok(hex::encode(Sha256::digest(&content)))
}

fn open_editor(editor: &str, path: &Path) -> Result<()> {
    let status = Command::new(editor)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        return Err(Error::ConfigError(format!(
            "Editor exited with error status: {}",
            status
        )));
    }
    Ok(())
}

/// Parse and validate the file on disk
fn check_config() -> std::result::Result<(), String> {
    let cfg = config::load().map_err(|e| format!("Config parsing failed: {:#}", e))?;
    cfg.validate()
        .map_err(|e| format!("Config validation failed: {}", e))
}

enum Choice {
    EditAgain,
    Discard,
    KeepInvalid,
}

/// Prompt user for a choice when validation fails
fn prompt_validation_failure() -> Result<Choice> {
    println!("\nThe config file has errors. What would you like to do?");
    println!("  1. Edit again to fix errors");
    println!("  2. Discard changes (config will remain invalid until fixed)");
    println!("  3. Keep invalid config anyway (not recommended)");
    print!("\nChoice (1-3): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    match input.trim() {
        "1" => Ok(Choice::EditAgain),
        "2" => Ok(Choice::Discard),
        "3" => Ok(Choice::KeepInvalid),
        _ => Err(Error::ConfigError("Invalid choice".to_string())),
    }
}

/// Run the edit command
pub async fn run() -> Result<()> {
    let config_path = config::config_path()?;
    if config::save_default()? {
        println!("Created default config at: {}", config_path.display());
    }

    let hash_before =
        hash_file(&config_path).context("Failed to hash config file before editing")?;

    let editor = get_editor();
    open_editor(&editor, &config_path)?;

    let hash_after = hash_file(&config_path).context("Failed to hash config file after editing")?;
    if hash_before == hash_after {
        println!("No changes made to config");
        return Ok(());
    }

    while let Err(problem) = check_config() {
        eprintln!("\n{}", problem);

        if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            return Err(Error::ConfigError(format!(
                "{} in non-interactive mode. Please fix manually: {}",
                problem,
                config_path.display()
            )));
        }

        match prompt_validation_failure()? {
            Choice::EditAgain => open_editor(&editor, &config_path)?,
            Choice::Discard => {
                println!("\nPlease manually fix the config file or delete it to start over.");
                return Err(Error::ConfigError(problem));
            }
            Choice::KeepInvalid => {
                println!("\nWarning: Config file contains errors. Commands will refuse to run until it is fixed.");
                return Ok(());
            }
        }
    }

    println!(
        "Config saved and validated successfully: {}",
        config_path.display()
    );
    Ok(())
}
