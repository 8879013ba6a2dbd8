//! music-skill-daemon: voice control for a remote music player
//!
//! Bridges a spoken-dialog event bus to a stateful player daemon:
//! - Bounded-retry startup connection to the player, no auto-reconnect after
//! - Playback-mode state machine narrowing the active intent set on the bus
//! - Confidence gating of recognition events before any handler runs
//!
//! The dialog-bus bridge attaches over a Unix socket; the per-intent command
//! handlers and the player's command protocol are external collaborators.

mod bus;
mod config;
mod dispatch;
mod events;
mod framing;
mod gate;
mod handlers;
mod lifecycle;
mod mode;
mod player;
mod skill;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::bus::BusServer;
use crate::config::Config;
use crate::player::TcpPlayerLink;
use crate::skill::SkillSettings;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "music-skill-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.bus_socket_path, ?config.player_host, "configuration loaded");

    // Bus attachment for the dialog-bus bridge
    let (bus_tx, bus_rx) = mpsc::channel(64);
    let server = BusServer::new(&config.bus_socket_path, bus_tx)?;
    let publisher = server.publisher();

    // Player link and handler registry
    let link = TcpPlayerLink::new(config.player_host.clone(), config.player_port);
    let registry = handlers::default_registry(config.thresholds);

    // Connect and start the event loop; startup connection errors are fatal
    let handle = skill::start(
        SkillSettings::from(&config),
        link,
        publisher,
        registry,
        bus_rx,
    )
    .await?;

    info!("skill initialized, serving");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "bus attachment error");
            }
        }
        result = lifecycle::wait_for_shutdown() => {
            result?;
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    handle.shutdown().await;
    server.shutdown().await;

    info!("music-skill-daemon stopped");

    Ok(())
}
