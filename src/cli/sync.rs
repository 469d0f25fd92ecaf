use crate::backends::{Connectivity, ConnectivityMonitor};
use crate::cli::open_context;
use crate::display::online_label;
use crate::error::Result;
use crate::managers::ReplayWorker;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tracing::info;

#[derive(Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommand,
}

#[derive(Subcommand)]
pub enum SyncCommand {
    /// Run one replay pass now
    Replay {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Replay on every reconnect until interrupted
    Watch,
}

pub async fn run(args: SyncArgs) -> Result<()> {
    let ctx = open_context().await?;
    let replayer = Arc::new(ctx.replayer()?);

    match args.command {
        SyncCommand::Replay { json } => {
            let report = replayer.replay_pass().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Replayed {}, {} remaining",
                    report.replayed.to_string().green(),
                    report.remaining
                );
                if let Some(id) = report.halted_on {
                    println!("  Halted on {}", id.yellow());
                }
            }
        }
        SyncCommand::Watch => {
            let monitor = ConnectivityMonitor::spawn(ctx.require_remote()?, ctx.config.probe_interval());
            let worker = ReplayWorker::spawn(replayer, &monitor);
            let mut online = monitor.subscribe();

            info!("Watching connectivity");
            println!(
                "Watching connectivity ({} queued). Press Ctrl-C to stop.",
                ctx.queue.len().await
            );

            loop {
                tokio::select! {
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let is_online = *online.borrow_and_update();
                        println!("Remote is {}", online_label(is_online));
                    }
                    _ = tokio::signal::ctrl_c() => {
                        break;
                    }
                }
            }

            drop(worker);
            drop(monitor);
            println!("{} queued mutation(s) left", ctx.queue.len().await);
        }
    }

    Ok(())
}
