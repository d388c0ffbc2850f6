//! Tracker API server.

use clap::Parser;
use doomie::{ApiServer, AppState, ChangeNotifier, DoomieConfig, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How long in-flight requests get to finish after Ctrl+C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Doomie: habit tracker REST server.
#[derive(Parser)]
#[command(name = "doomie-server", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overriding the config file.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding the config file (0 = auto-assign).
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file, overriding the config file.
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DoomieConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(db) = cli.db {
        config.storage.db_path = db;
    }

    let _log_guard = doomie::logging::init(&config.logging)?;

    let store = Arc::new(SqliteStore::open(&config.storage.db_path)?);
    info!(db = %config.storage.db_path.display(), "document store ready");

    let notifier = ChangeNotifier::new(config.events.channel_capacity);
    let state = AppState::new(store, notifier)
        .with_keep_alive(Duration::from_secs(config.events.keep_alive_secs.max(1)));
    let server = ApiServer::start(state, &config.server).await?;

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down...");

    if tokio::time::timeout(SHUTDOWN_GRACE, server.shutdown())
        .await
        .is_err()
    {
        info!("open connections did not close in time; forcing shutdown");
    }
    Ok(())
}
