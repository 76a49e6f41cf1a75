//! Game Tracker Service
//!
//! Watches the SHL gameday API for games of the configured teams and posts
//! live updates to a Discord channel.

use anyhow::Result;
use dotenv::dotenv;
use game_tracker_rust::{Config, FileSnapshotStore, GameDiscovery, GameTracker, SnapshotStore};
use puckwatch_rust_core::clients::{DiscordClient, ShlClient};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Game Tracker Service...");

    let config = Config::from_env()?;
    info!("Config: {:?}", config);

    // Clients
    let shl = Arc::new(ShlClient::new(
        config.shl_api_base_url.clone(),
        config.http_timeout(),
    ));
    let discord = Arc::new(DiscordClient::new(
        config.discord_api_base_url.clone(),
        config.discord_token.clone(),
        config.http_timeout(),
    ));

    match discord.current_user().await {
        Ok(user) => info!("Logged in as {} ({})", user.username, user.id),
        Err(e) => warn!("Could not verify Discord login: {}", e),
    }

    let store: Option<Arc<dyn SnapshotStore>> = if config.play_by_play_logging {
        info!("Saving play-by-play to {:?}", config.play_by_play_dir);
        Some(Arc::new(FileSnapshotStore::new(config.play_by_play_dir.clone())))
    } else {
        None
    };

    let tracker = GameTracker::new(shl.clone(), discord, store, config.tracker_config());
    let discovery = GameDiscovery::new(shl, tracker.clone(), config.team_codes.clone());
    let discovery_task = tokio::spawn(
        discovery.run(config.discovery_interval(), tracker.shutdown_signal()),
    );

    shutdown_signal().await;
    info!("Received shutdown signal");

    let report = tracker.shutdown(config.shutdown_timeout()).await;
    if let Err(e) = discovery_task.await {
        error!("Discovery task failed: {}", e);
    }
    info!(
        "Shutdown complete: {} game task(s) stopped, {} aborted",
        report.drained, report.aborted
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
