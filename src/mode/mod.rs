//! Playback-mode state machine
//!
//! Narrows the set of intents active on the dialog bus based on what the
//! player daemon reports, and drives the listening-feedback indicator:
//! - Init: full intent set, indicator off
//! - Playing: playback intent set, indicator off
//! - Pausing: paused intent set, indicator on
//! - AllEnabled: degenerate startup mode, everything stays active forever

mod controller;

pub use controller::{ModeController, PlaybackMode};
pub use controller::{INTENTS_ALL, INTENTS_PAUSING, INTENTS_PLAYING};
