//! Event types flowing through the skill
//!
//! Two sources feed the single event loop: the dialog bus (recognition
//! results and dialog-session toggles) and the player link (lifecycle and
//! playback-state changes). Events are ephemeral — consumed once, never
//! persisted.

use serde::{Deserialize, Serialize};

/// A named parameter extracted from an utterance, with its own confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Slot name (e.g. "volume_level")
    pub name: String,

    /// Raw extracted value
    pub value: String,

    /// Extraction confidence (0.0 - 1.0)
    pub confidence: f32,
}

/// A single recognized voice-intent occurrence delivered by the dialog bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionEvent {
    /// Classified intent name (e.g. "pauseMusic")
    pub intent: String,

    /// Intent classification confidence (0.0 - 1.0)
    pub intent_confidence: f32,

    /// Confidence of the underlying speech-to-text result (0.0 - 1.0)
    pub asr_confidence: f32,

    /// Extracted slots, possibly empty
    #[serde(default)]
    pub slots: Vec<Slot>,

    /// Site the utterance came from
    #[serde(default = "default_site")]
    pub site_id: String,
}

fn default_site() -> String {
    "default".to_string()
}

/// Events emitted by the player link once a connection is established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Connection established and session ready
    Ready,

    /// Live connection dropped after startup
    Disconnected,

    /// Daemon reports active playback
    Playing,

    /// Daemon reports playback paused
    Pausing,

    /// Daemon reports playback stopped
    Stopped,
}

/// Events delivered by the dialog-bus attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusEvent {
    /// A voice intent was recognized
    Recognition(RecognitionEvent),

    /// A dialog session opened on a site
    SessionStarted { site_id: String },

    /// A dialog session closed on a site
    SessionEnded { site_id: String },
}

impl std::fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerEvent::Ready => write!(f, "READY"),
            PlayerEvent::Disconnected => write!(f, "DISCONNECTED"),
            PlayerEvent::Playing => write!(f, "PLAYING"),
            PlayerEvent::Pausing => write!(f, "PAUSING"),
            PlayerEvent::Stopped => write!(f, "STOPPED"),
        }
    }
}
