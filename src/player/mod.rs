//! Player daemon connection handling
//!
//! The protocol internals of the player (how play/pause/stop are issued)
//! live behind the [`PlayerLink`] capability; this module owns the startup
//! connection sequence with its bounded retries and the lifecycle events
//! reported afterwards.

mod link;
mod supervisor;

pub use link::{LinkError, PlayerLink, PlayerSession, TcpPlayerLink};
pub use supervisor::{ConnectError, ConnectionState, ConnectionSupervisor};
