pub mod edit;
pub mod logs;
pub mod queue;
pub mod sync;
pub mod timer;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config;
use crate::context::AppContext;

#[derive(Parser)]
#[command(name = "devlogify")]
#[command(about = "Work-session timer and offline mutation queue for Devlogify")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging to terminal
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Override config directory (for testing)
    #[arg(long, global = true)]
    pub config_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start, pause, stop or inspect the work-session timer
    #[command(visible_alias = "t")]
    Timer(timer::TimerArgs),

    /// Inspect or edit the offline mutation queue
    #[command(visible_alias = "q")]
    Queue(queue::QueueArgs),

    /// Replay queued mutations against the remote
    Sync(sync::SyncArgs),

    /// View log files
    Logs(logs::LogsArgs),

    /// Edit the devlogify configuration file
    Edit,

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    /// Forward `--config-dir` so every config lookup in the process sees it
    pub fn apply_config_dir(&self) {
        if let Some(config_dir) = &self.config_dir {
            std::env::set_var(config::CONFIG_DIR_ENV, config_dir);
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Timer(args) => timer::run(args).await.map_err(Into::into),
        Commands::Queue(args) => queue::run(args).await.map_err(Into::into),
        Commands::Sync(args) => sync::run(args).await.map_err(Into::into),
        Commands::Logs(args) => logs::run(args).await.map_err(Into::into),
        Commands::Edit => edit::run().await.map_err(Into::into),
        Commands::Completions { shell } => generate_completions(shell),
    }
}

/// Load config and open the application context
pub(crate) async fn open_context() -> crate::error::Result<AppContext> {
    let config = config::load()?;
    config
        .validate()
        .map_err(crate::error::Error::ConfigError)?;
    AppContext::open(config).await
}

/// Generate shell completions
pub fn generate_completions(shell: clap_complete::Shell) -> Result<()> {
    use clap::CommandFactory;
    use std::io;
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "devlogify", &mut io::stdout());
    Ok(())
}
