use crate::cli::open_context;
use crate::display::status_label;
use crate::error::Result;
use crate::managers::TimerSnapshot;
use crate::store::models::TimerStatus;
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;
use std::io::Write;

#[derive(Args)]
pub struct TimerArgs {
    #[command(subcommand)]
    pub command: TimerCommand,
}

#[derive(Subcommand)]
pub enum TimerCommand {
    /// Start a new session
    Start {
        /// Task being timed
        #[arg(long)]
        task_id: Option<String>,

        /// Task label shown next to the timer
        #[arg(long)]
        task_title: Option<String>,
    },

    /// Pause the running session
    Pause,

    /// Resume a paused session
    Resume,

    /// Stop and commit the session as a time entry
    Stop {
        /// Owner of the time entry (defaults to remote.user_id)
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Drop the session without committing it
    Discard,

    /// Show the current session
    Status {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(args: TimerArgs) -> Result<()> {
    let ctx = open_context().await?;

    match args.command {
        TimerCommand::Start { task_id, task_title } => {
            let snapshot = ctx.timer.start(task_id, task_title).await?;
            println!("{} Timer started", "✓".green());
            print_snapshot(&snapshot);
        }
        TimerCommand::Pause => {
            let snapshot = ctx.timer.pause().await?;
            print_snapshot(&snapshot);
        }
        TimerCommand::Resume => {
            let snapshot = ctx.timer.resume().await?;
            print_snapshot(&snapshot);
        }
        TimerCommand::Stop { user_id } => {
            let user_id = ctx.user_id(user_id)?;
            let entry = ctx.timer.stop(&user_id).await?;
            println!(
                "{} Committed {} minute(s){}",
                "✓".green(),
                entry.duration_minutes,
                entry
                    .task_id
                    .as_deref()
                    .map(|task| format!(" to task {}", task))
                    .unwrap_or_default()
            );
        }
        TimerCommand::Discard => {
            ctx.timer.discard().await;
            println!("Timer discarded");
        }
        TimerCommand::Status { watch, json } => {
            let snapshot = ctx.timer.snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }

            if watch && snapshot.status == TimerStatus::Running {
                watch_ticks(&ctx.timer).await?;
            }
        }
    }

    ctx.timer.shutdown();
    Ok(())
}

fn print_snapshot(snapshot: &TimerSnapshot) {
    println!("Status: {}", status_label(snapshot.status));
    if snapshot.status == TimerStatus::Idle {
        return;
    }
    println!("  Elapsed: {}", snapshot.display.bold());
    if let Some(title) = &snapshot.session.task_title {
        println!("  Task: {}", title);
    } else if let Some(task_id) = &snapshot.session.task_id {
        println!("  Task: {}", task_id);
    }
}

async fn watch_ticks(timer: &crate::managers::TimerEngine) -> Result<()> {
    let mut ticks = timer.subscribe();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                let tick = ticks.borrow_and_update().clone();
                write!(stdout, "\r  {}   ", tick.display)?;
                stdout.flush()?;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    println!();
    Ok(())
}
