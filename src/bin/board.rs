//! Headless board: times tasks and follows done events, logging each change.

use clap::{Parser, Subcommand};
use doomie::board::Board;
use doomie::model::RecordId;
use doomie::{DoomieConfig, TrackerClient};
use futures_util::StreamExt;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Doomie board client.
#[derive(Parser)]
#[command(name = "doomie-board", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server base URL, overriding the config file.
    #[arg(long)]
    server_url: Option<String>,

    /// Milliseconds a task stays active, overriding the config file.
    #[arg(long)]
    dwell_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Time every task and follow the done event feed until Ctrl+C.
    Watch,

    /// Mark a task done.
    Press {
        /// Task id.
        task_id: RecordId,

        /// Button the completion came through.
        #[arg(long)]
        button: Option<RecordId>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DoomieConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.server_url {
        config.board.server_url = url;
    }
    if let Some(dwell) = cli.dwell_ms {
        config.board.active_dwell_ms = dwell;
    }

    let _log_guard = doomie::logging::init(&config.logging)?;
    let client = TrackerClient::new(config.board.server_url.clone());

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(client, &config).await,
        Command::Press { task_id, button } => {
            let board = Board::load(client, &config.board).await?;
            let event = board.press(&task_id, button.as_ref()).await?;
            board.teardown();
            println!("{} done at {}", event.task_name, event.time.to_rfc3339());
            Ok(())
        }
    }
}

async fn watch(client: TrackerClient, config: &DoomieConfig) -> anyhow::Result<()> {
    let mut changes = client.done_event_changes().await?;
    let mut board = Board::load(client, &config.board).await?;
    let mut activity = board.activity_changes();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down...");
                break;
            }
            change = activity.recv() => match change {
                Ok(change) => {
                    let name = board.task(&change.task_id).map_or("<unknown>", |t| t.name.as_str());
                    info!(task = name, activity = ?change.activity, "activity changed");
                }
                Err(RecvError::Lagged(n)) => warn!(lagged = n, "activity listener lagged"),
                Err(RecvError::Closed) => break,
            },
            change = changes.next() => match change {
                Some(Ok(change)) => {
                    info!(
                        event = change.kind.event_name(),
                        task = %change.doc.task_name,
                        "done event change"
                    );
                    board.apply_change(change);
                }
                Some(Err(e)) => warn!(error = %e, "bad event from server"),
                None => {
                    warn!("server closed the event stream");
                    break;
                }
            },
        }
    }

    board.teardown();
    Ok(())
}
