//! Unix domain socket server for the dialog-bus bridge
//!
//! The external bridge process connects here; inbound frames become
//! [`BusEvent`]s on the skill's event channel, outbound publish frames are
//! fanned out to every attached bridge.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, trace, warn};

use crate::events::BusEvent;
use crate::framing;

use super::protocol::Outbound;
use super::DialogPublisher;

/// Accepts bridge connections on a Unix socket
pub struct BusServer {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    event_tx: mpsc::Sender<BusEvent>,
    outbound_tx: broadcast::Sender<Outbound>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BusServer {
    /// Bind the attachment socket
    pub fn new(socket_path: &Path, event_tx: mpsc::Sender<BusEvent>) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only: the bridge runs as the same user
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (outbound_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "bus attachment listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            event_tx,
            outbound_tx,
            shutdown_tx,
        })
    }

    /// Publisher handle for the rest of the skill
    pub fn publisher(&self) -> BusPublisher {
        BusPublisher {
            outbound_tx: self.outbound_tx.clone(),
        }
    }

    /// Run the server, accepting bridge connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("bus bridge connected");
                    let event_tx = self.event_tx.clone();
                    let outbound_rx = self.outbound_tx.subscribe();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_bridge(stream, event_tx, outbound_rx) => {
                                if let Err(e) = result {
                                    warn!(?e, "bridge handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("bridge handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single bridge connection
    async fn handle_bridge(
        stream: UnixStream,
        event_tx: mpsc::Sender<BusEvent>,
        mut outbound_rx: broadcast::Receiver<Outbound>,
    ) -> Result<()> {
        let (mut read_half, mut write_half) = stream.into_split();

        loop {
            tokio::select! {
                inbound = framing::read_frame::<BusEvent, _>(&mut read_half) => {
                    match inbound? {
                        Some(event) => {
                            trace!(?event, "bus event received");
                            if event_tx.send(event).await.is_err() {
                                // Skill loop is gone; nothing left to feed
                                return Ok(());
                            }
                        }
                        None => {
                            debug!("bus bridge disconnected");
                            return Ok(());
                        }
                    }
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Ok(frame) => {
                            framing::write_frame(&mut write_half, &frame).await?;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "bridge fell behind on publishes");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("bus attachment shutdown complete");
    }
}

/// Cloneable publish handle backed by the attachment's outbound channel
#[derive(Clone)]
pub struct BusPublisher {
    outbound_tx: broadcast::Sender<Outbound>,
}

impl DialogPublisher for BusPublisher {
    fn publish_intent_filter(&self, intents: &[&str]) {
        let frame = Outbound::IntentFilter {
            intents: intents.iter().map(|s| s.to_string()).collect(),
        };
        if self.outbound_tx.send(frame).is_err() {
            trace!("no bridge attached, intent filter not delivered");
        }
    }

    fn set_feedback_sound(&self, on: bool) {
        if self.outbound_tx.send(Outbound::FeedbackSound { on }).is_err() {
            trace!("no bridge attached, feedback command not delivered");
        }
    }

    fn announce(&self, text: &str, site_id: &str) {
        let frame = Outbound::Announce {
            text: text.to_string(),
            site_id: site_id.to_string(),
        };
        if self.outbound_tx.send(frame).is_err() {
            trace!("no bridge attached, announcement not delivered");
        }
    }
}
