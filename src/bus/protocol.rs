//! Frames exchanged with the dialog-bus bridge
//!
//! Inbound frames are [`crate::events::BusEvent`]s; outbound frames are the
//! three publish primitives the skill is allowed to emit.

use serde::{Deserialize, Serialize};

/// Publish frames sent to the bridge for delivery on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Set of intent names that should currently fire
    IntentFilter { intents: Vec<String> },

    /// Listening-feedback indicator command
    FeedbackSound { on: bool },

    /// Notification speech announcing readiness or errors
    Announce { text: String, site_id: String },
}
