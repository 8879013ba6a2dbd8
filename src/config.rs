//! Configuration loading and management
//!
//! Everything comes from the environment with compiled defaults; the
//! confidence thresholds are read once here and stay immutable for the
//! lifetime of the process.

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use crate::gate::ConfidenceThresholds;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Narrow the active intent set based on playback mode
    pub context_control: bool,

    /// Drive the listening-feedback indicator on mode changes
    pub sound_feedback: bool,

    /// Admission thresholds for recognition events
    pub thresholds: ConfidenceThresholds,

    /// Startup connection attempts against the player daemon
    pub connect_attempts: u32,

    /// Seconds to wait between failed connection attempts
    pub connect_delay_secs: u64,

    /// Player daemon host
    pub player_host: String,

    /// Player daemon port
    pub player_port: u16,

    /// Unix socket where the dialog-bus bridge attaches
    pub bus_socket_path: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let bus_socket_path = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("music-skill")
            .join("bus.sock");

        Ok(Self {
            context_control: env_bool("MUSIC_SKILL_CONTEXT_CONTROL", true),
            sound_feedback: env_bool("MUSIC_SKILL_SOUND_FEEDBACK", true),
            thresholds: ConfidenceThresholds {
                intent_standard: env_confidence("MUSIC_SKILL_CONFIDENCE_INTENT_STANDARD", 0.5),
                intent_drop: env_confidence("MUSIC_SKILL_CONFIDENCE_INTENT_DROP", 0.3),
                slot_drop: env_confidence("MUSIC_SKILL_CONFIDENCE_SLOT_DROP", 0.4),
                asr_drop: env_confidence("MUSIC_SKILL_CONFIDENCE_ASR_DROP", 0.5),
            },
            connect_attempts: env_parse("MUSIC_SKILL_CONNECT_ATTEMPTS", 3).max(1),
            connect_delay_secs: env_parse("MUSIC_SKILL_CONNECT_DELAY_SECS", 30),
            player_host: std::env::var("MUSIC_SKILL_PLAYER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            player_port: env_parse("MUSIC_SKILL_PLAYER_PORT", 6600),
            bus_socket_path,
        })
    }

    /// Ensure the socket directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.bus_socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Thresholds are probabilities; anything outside [0,1] falls back to the
/// default rather than silently skewing the gate
fn env_confidence(key: &str, default: f32) -> f32 {
    match std::env::var(key).ok().and_then(|v| v.parse::<f32>().ok()) {
        Some(value) if (0.0..=1.0).contains(&value) => value,
        Some(value) => {
            warn!(key, value, "confidence threshold outside [0,1], using default");
            default
        }
        None => default,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
