use clap::Parser;
use devlogify::cli::{self, Cli};
use devlogify::{config, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.apply_config_dir();

    // A broken config file still gets file logging; the command reports the parse error
    let config = config::load().unwrap_or_default();
    logging::init(&config, cli.verbose)?;

    cli::run(cli).await
}
