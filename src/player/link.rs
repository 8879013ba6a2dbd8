//! Transport link to the audio daemon
//!
//! A link knows how to open one connection and feed the daemon's
//! playback-state reports into the skill's event channel. The default
//! implementation dials TCP and reads length-prefixed JSON frames; anything
//! richer (command issuance, protocol handshakes) belongs to the external
//! player client, not here.

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::PlayerEvent;
use crate::framing;

/// Why a single connection attempt did not produce a session
#[derive(Debug, Error)]
pub enum LinkError {
    /// The daemon could not be reached at all; worth retrying
    #[error("player daemon unreachable: {0}")]
    Unreachable(#[source] std::io::Error),

    /// The daemon was reached but the session could not be established
    #[error("player session failed: {0}")]
    Session(String),
}

/// A live connection to the player daemon.
///
/// The session owns the reader task that forwards playback-state events.
/// When the underlying stream ends, the reader emits exactly one
/// [`PlayerEvent::Disconnected`] and exits; closing the session aborts the
/// reader without emitting anything.
pub struct PlayerSession {
    reader: JoinHandle<()>,
}

impl PlayerSession {
    pub fn new(reader: JoinHandle<()>) -> Self {
        Self { reader }
    }

    /// Tear down the live connection
    pub fn close(&self) {
        self.reader.abort();
    }
}

/// Capability interface for opening player connections.
///
/// `connect` performs exactly one dial; retry policy is the supervisor's
/// job. Implementations must send `Playing`/`Pausing`/`Stopped` reports and
/// a final `Disconnected` on the given channel.
pub trait PlayerLink: Send {
    fn connect(
        &mut self,
        events: mpsc::Sender<PlayerEvent>,
    ) -> impl std::future::Future<Output = Result<PlayerSession, LinkError>> + Send;
}

/// Default link: TCP with length-prefixed JSON state frames
pub struct TcpPlayerLink {
    host: String,
    port: u16,
}

impl TcpPlayerLink {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl PlayerLink for TcpPlayerLink {
    async fn connect(
        &mut self,
        events: mpsc::Sender<PlayerEvent>,
    ) -> Result<PlayerSession, LinkError> {
        let addr = (self.host.as_str(), self.port);
        let stream = TcpStream::connect(addr)
            .await
            .map_err(LinkError::Unreachable)?;

        debug!(host = %self.host, port = self.port, "player daemon dialed");

        let reader = tokio::spawn(async move {
            let mut stream = stream;
            loop {
                match framing::read_frame::<PlayerEvent, _>(&mut stream).await {
                    Ok(Some(event @ (PlayerEvent::Playing | PlayerEvent::Pausing | PlayerEvent::Stopped))) => {
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Ok(Some(other)) => {
                        debug!(event = %other, "ignoring unexpected player frame");
                    }
                    Ok(None) => {
                        break;
                    }
                    Err(e) => {
                        warn!(?e, "player stream error");
                        break;
                    }
                }
            }
            let _ = events.send(PlayerEvent::Disconnected).await;
        });

        Ok(PlayerSession::new(reader))
    }
}
