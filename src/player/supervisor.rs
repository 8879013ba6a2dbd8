//! Startup connection supervision
//!
//! Attempts are strictly sequential with a fixed delay between failures.
//! The retry budget applies to startup only: once a session is live, a
//! later drop is reported as an event and never re-enters this sequence.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::events::PlayerEvent;

use super::link::{LinkError, PlayerLink, PlayerSession};

/// Where the supervisor currently stands with the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}

/// Terminal startup-connection failures; both abort initialization
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Every attempt found the daemon unreachable
    #[error("player daemon unreachable after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// The daemon was reached but the session could not be established
    #[error("player daemon connection failed: {reason}")]
    Failed { reason: String },
}

/// Drives the bounded-retry connection sequence over a [`PlayerLink`]
pub struct ConnectionSupervisor<L: PlayerLink> {
    link: L,
    state: ConnectionState,
}

impl<L: PlayerLink> ConnectionSupervisor<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            state: ConnectionState::Disconnected,
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Record a post-startup drop of the live connection.
    ///
    /// The bounded retry sequence is never re-entered for this; it only
    /// keeps the observed state truthful once the session is gone.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Connect with up to `max_attempts` sequential dials, sleeping `delay`
    /// between failed attempts (never after the last one).
    ///
    /// On success, emits [`PlayerEvent::Ready`] exactly once on `events`
    /// and returns the live session. A session-level failure on any attempt
    /// is terminal immediately; only an unreachable daemon consumes the
    /// retry budget.
    pub async fn connect(
        &mut self,
        max_attempts: u32,
        delay: Duration,
        events: mpsc::Sender<PlayerEvent>,
    ) -> Result<PlayerSession, ConnectError> {
        let max_attempts = max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.state = ConnectionState::Connecting;
            info!(attempt, max_attempts, "connecting to player daemon");

            match self.link.connect(events.clone()).await {
                Ok(session) => {
                    self.state = ConnectionState::Connected;
                    info!(attempt, "player daemon connected");
                    let _ = events.send(PlayerEvent::Ready).await;
                    return Ok(session);
                }
                Err(LinkError::Unreachable(e)) => {
                    self.state = ConnectionState::Disconnected;
                    warn!(attempt, ?e, "player daemon unreachable");
                    if attempt < max_attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(LinkError::Session(reason)) => {
                    self.state = ConnectionState::Disconnected;
                    warn!(attempt, %reason, "player session failed");
                    return Err(ConnectError::Failed { reason });
                }
            }
        }

        Err(ConnectError::Exhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    /// Link double that replays a script of per-attempt outcomes
    struct ScriptedLink {
        script: VecDeque<Result<(), LinkError>>,
        attempts: Arc<AtomicU32>,
    }

    impl ScriptedLink {
        fn new(script: Vec<Result<(), LinkError>>) -> (Self, Arc<AtomicU32>) {
            let attempts = Arc::new(AtomicU32::new(0));
            (
                Self {
                    script: script.into(),
                    attempts: Arc::clone(&attempts),
                },
                attempts,
            )
        }
    }

    impl PlayerLink for ScriptedLink {
        async fn connect(
            &mut self,
            _events: mpsc::Sender<PlayerEvent>,
        ) -> Result<PlayerSession, LinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.script.pop_front().expect("script exhausted") {
                Ok(()) => Ok(PlayerSession::new(tokio::spawn(async {}))),
                Err(e) => Err(e),
            }
        }
    }

    fn unreachable() -> LinkError {
        LinkError::Unreachable(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_budget_with_two_delays() {
        let (link, attempts) = ScriptedLink::new(vec![
            Err(unreachable()),
            Err(unreachable()),
            Err(unreachable()),
        ]);
        let mut supervisor = ConnectionSupervisor::new(link);
        let (tx, mut rx) = mpsc::channel(8);

        let start = Instant::now();
        let result = supervisor.connect(3, Duration::from_secs(30), tx).await;

        assert!(matches!(result, Err(ConnectError::Exhausted { attempts: 3 })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two inter-attempt delays, none after the final failure
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt() {
        let (link, attempts) = ScriptedLink::new(vec![Err(unreachable()), Ok(()), Ok(())]);
        let mut supervisor = ConnectionSupervisor::new(link);
        let (tx, mut rx) = mpsc::channel(8);

        let result = supervisor.connect(3, Duration::from_secs(30), tx).await;

        assert!(result.is_ok());
        // No third attempt once connected
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        // Ready reported exactly once
        assert_eq!(rx.recv().await, Some(PlayerEvent::Ready));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_failure_is_terminal_immediately() {
        let (link, attempts) = ScriptedLink::new(vec![
            Err(LinkError::Session("bad handshake".to_string())),
            Ok(()),
        ]);
        let mut supervisor = ConnectionSupervisor::new(link);
        let (tx, _rx) = mpsc::channel(8);

        let start = Instant::now();
        let result = supervisor.connect(3, Duration::from_secs(30), tx).await;

        assert!(matches!(result, Err(ConnectError::Failed { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        // Terminal failure does not wait out the retry delay
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_post_startup_drop_flips_state() {
        let (link, _) = ScriptedLink::new(vec![Ok(())]);
        let mut supervisor = ConnectionSupervisor::new(link);
        let (tx, _rx) = mpsc::channel(8);

        supervisor
            .connect(1, Duration::from_secs(0), tx)
            .await
            .unwrap();
        assert_eq!(supervisor.state(), ConnectionState::Connected);

        supervisor.mark_disconnected();
        assert_eq!(supervisor.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let (link, attempts) = ScriptedLink::new(vec![Ok(())]);
        let mut supervisor = ConnectionSupervisor::new(link);
        let (tx, mut rx) = mpsc::channel(8);

        let result = supervisor.connect(3, Duration::from_secs(30), tx).await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(rx.recv().await, Some(PlayerEvent::Ready));
    }
}
