use crate::backends::ManualConnectivity;
use crate::cli::open_context;
use crate::display::queue_line;
use crate::error::{Error, Result};
use crate::managers::DispatchOutcome;
use crate::store::models::{EntityKind, MutationType};
use clap::{Args, Subcommand};
use owo_colors::OwoColorize;
use std::sync::Arc;

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List queued mutations in replay order
    #[command(visible_alias = "ls")]
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Submit a mutation; it is queued when the remote can't be reached
    Add {
        /// create, update or delete
        mutation: String,

        /// project, task, note or time_entry
        entity: String,

        /// JSON payload
        payload: String,

        /// Queue without trying the remote
        #[arg(long)]
        offline: bool,
    },

    /// Remove a single queued mutation
    #[command(visible_aliases = ["rm"])]
    Remove {
        id: String,
    },

    /// Drop every queued mutation
    Clear,
}

pub async fn run(args: QueueArgs) -> Result<()> {
    let ctx = open_context().await?;

    match args.command {
        QueueCommand::List { json } => {
            let items = ctx.queue.get_queue().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("Offline queue is empty");
            } else {
                println!("Offline queue ({}):", items.len());
                for (i, item) in items.iter().enumerate() {
                    println!("{}", queue_line(i + 1, item));
                }
            }
        }
        QueueCommand::Add { mutation, entity, payload, offline } => {
            let mutation = MutationType::from_str(&mutation).ok_or_else(|| {
                Error::ConfigError(format!(
                    "Unknown mutation '{}'. Use create, update or delete",
                    mutation
                ))
            })?;
            let entity = EntityKind::from_str(&entity).ok_or_else(|| {
                Error::ConfigError(format!(
                    "Unknown entity '{}'. Use project, task, note or time_entry",
                    entity
                ))
            })?;
            let payload: serde_json::Value = serde_json::from_str(&payload)?;

            let outcome = match &ctx.remote {
                Some(remote) if !offline => {
                    let online = remote.ping().await.is_ok();
                    let dispatcher = ctx.dispatcher(Arc::new(ManualConnectivity::new(online)))?;
                    dispatcher.submit(mutation, entity, payload).await?
                }
                _ => {
                    let item = ctx.queue.build_item(mutation, entity, payload);
                    item.validate()?;
                    let id = item.id.clone();
                    ctx.queue.push(item).await;
                    DispatchOutcome::Queued { id }
                }
            };

            match outcome {
                DispatchOutcome::Applied { id } => println!("{} Applied {}", "✓".green(), id),
                DispatchOutcome::Queued { id } => println!("{} Queued {}", "…".yellow(), id),
            }
        }
        QueueCommand::Remove { id } => {
            if !ctx.queue.dequeue(&id).await {
                return Err(Error::QueueItemNotFound { id });
            }
            println!("Removed {}", id);
        }
        QueueCommand::Clear => {
            let count = ctx.queue.len().await;
            ctx.queue.clear().await;
            println!("Removed {} queued mutation(s)", count);
        }
    }

    Ok(())
}
