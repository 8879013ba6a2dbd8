//! Built-in intent handlers
//!
//! Real per-intent command handlers (track selection, volume, queueing)
//! live outside this daemon and register themselves through
//! [`IntentDispatchCore::register`]. The speaker-interrupt handler ships
//! here as a stub that ends the interaction without speech.

use anyhow::Result;
use tracing::debug;

use crate::dispatch::{HandlerOutcome, IntentDispatchCore, IntentHandler};
use crate::events::RecognitionEvent;
use crate::gate::ConfidenceThresholds;
use crate::mode::PlaybackMode;

/// Placeholder for "stop talking" style interruptions.
///
/// TODO: wire this to the player client's pause command once the command
/// surface lands.
pub struct SpeakerInterruptHandler;

impl IntentHandler for SpeakerInterruptHandler {
    fn handle(&mut self, event: &RecognitionEvent, mode: PlaybackMode) -> Result<HandlerOutcome> {
        debug!(site_id = %event.site_id, mode = %mode, "speaker interrupt");
        Ok(HandlerOutcome::NoOp)
    }
}

/// Dispatch core with the built-in handlers registered
pub fn default_registry(thresholds: ConfidenceThresholds) -> IntentDispatchCore {
    let mut core = IntentDispatchCore::new(thresholds);
    core.register("speakerInterrupt", Box::new(SpeakerInterruptHandler));
    core
}
