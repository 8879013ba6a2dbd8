//! Skill entry point and event loop
//!
//! `start` runs the startup connection sequence (fatal on failure), pins
//! the startup mode, then spawns the single task that owns all business
//! state. Every bus event and player event is handled to completion before
//! the next one; nothing here needs a lock.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::bus::DialogPublisher;
use crate::config::Config;
use crate::dispatch::IntentDispatchCore;
use crate::events::{BusEvent, PlayerEvent};
use crate::mode::ModeController;
use crate::player::{ConnectError, ConnectionState, ConnectionSupervisor, PlayerLink};

/// Spoken announcements on the readiness/error channel
const MSG_READY: &str = "The music skill is connected and ready.";
const MSG_CONNECTION_LOST: &str = "I lost the connection to the music player.";
const MSG_CONNECTION_FAILED: &str = "I could not reach the music player.";

/// Knobs the entry point needs, extracted from [`Config`]
#[derive(Debug, Clone)]
pub struct SkillSettings {
    pub context_control: bool,
    pub sound_feedback: bool,
    pub thresholds: crate::gate::ConfidenceThresholds,
    pub connect_attempts: u32,
    pub connect_delay: Duration,
}

impl From<&Config> for SkillSettings {
    fn from(config: &Config) -> Self {
        Self {
            context_control: config.context_control,
            sound_feedback: config.sound_feedback,
            thresholds: config.thresholds,
            connect_attempts: config.connect_attempts,
            connect_delay: Duration::from_secs(config.connect_delay_secs),
        }
    }
}

/// Running skill; teardown disconnects cleanly
pub struct SkillHandle {
    shutdown_tx: mpsc::Sender<()>,
    state_rx: watch::Receiver<ConnectionState>,
    task: tokio::task::JoinHandle<()>,
}

impl SkillHandle {
    /// Last observed connection state of the player daemon
    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Stop the event loop and drop the player session
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

/// Connect to the player daemon and start the event loop.
///
/// Both [`ConnectError`] variants are fatal here: the caller aborts
/// initialization. A post-startup disconnect is only announced; the loop
/// keeps running without reconnecting.
pub async fn start<L, P>(
    settings: SkillSettings,
    link: L,
    publisher: P,
    mut dispatch: IntentDispatchCore,
    mut bus_rx: mpsc::Receiver<BusEvent>,
) -> Result<SkillHandle, ConnectError>
where
    L: PlayerLink + 'static,
    P: DialogPublisher + Clone + Send + 'static,
{
    let (player_tx, mut player_rx) = mpsc::channel::<PlayerEvent>(32);
    let player_keepalive = player_tx.clone();

    let mut supervisor = ConnectionSupervisor::new(link);
    let session = match supervisor
        .connect(settings.connect_attempts, settings.connect_delay, player_tx)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            debug!(state = ?supervisor.state(), "startup connection abandoned");
            publisher.announce(MSG_CONNECTION_FAILED, "default");
            return Err(e);
        }
    };

    let mut controller = ModeController::start(
        settings.context_control,
        settings.sound_feedback,
        publisher.clone(),
    );

    debug!(?settings.thresholds, "confidence thresholds in effect");

    // The supervisor stays with the loop so a later drop is reflected in
    // its state; the watch channel is the handle's read-only view of it
    let (state_tx, state_rx) = watch::channel(supervisor.state());

    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let task = tokio::spawn(async move {
        let mut session_active = false;
        // Keeps the player channel open after the link's reader exits, so a
        // post-startup disconnect leaves the loop running without reconnecting
        let _player_tx = player_keepalive;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("skill loop shutting down");
                    break;
                }
                player_event = player_rx.recv() => {
                    match player_event {
                        Some(PlayerEvent::Ready) => {
                            info!("player daemon ready");
                            publisher.announce(MSG_READY, "default");
                        }
                        Some(PlayerEvent::Disconnected) => {
                            // Reported, not retried: a silently looping
                            // reconnect would mask an unreachable daemon
                            warn!("player daemon connection lost");
                            supervisor.mark_disconnected();
                            let _ = state_tx.send(supervisor.state());
                            publisher.announce(MSG_CONNECTION_LOST, "default");
                        }
                        Some(event) => {
                            controller.handle_player_state(event);
                        }
                        None => {
                            debug!("player event channel closed");
                            break;
                        }
                    }
                }
                bus_event = bus_rx.recv() => {
                    match bus_event {
                        Some(BusEvent::Recognition(event)) => {
                            let outcome = dispatch.dispatch(&event, controller.mode());
                            debug!(intent = %event.intent, ?outcome, "dispatch complete");
                        }
                        Some(BusEvent::SessionStarted { site_id }) => {
                            session_active = true;
                            debug!(%site_id, session_active, "dialog session started");
                        }
                        Some(BusEvent::SessionEnded { site_id }) => {
                            session_active = false;
                            debug!(%site_id, session_active, "dialog session ended");
                        }
                        None => {
                            debug!("bus event channel closed");
                            break;
                        }
                    }
                }
            }
        }

        session.close();
    });

    Ok(SkillHandle {
        shutdown_tx,
        state_rx,
        task,
    })
}
