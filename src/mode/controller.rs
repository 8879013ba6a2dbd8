//! Mode controller implementation
//!
//! Transitions are edge-triggered: a repeated state report from a chattering
//! daemon connection publishes nothing and toggles nothing. The controller
//! is the sole writer of the mode; the single-threaded event loop serializes
//! every call into it.

use tracing::{debug, info};

use crate::bus::DialogPublisher;
use crate::events::PlayerEvent;

/// Full intent set, active in Init and AllEnabled
pub const INTENTS_ALL: &[&str] = &[
    "playMusic",
    "resumeMusic",
    "pauseMusic",
    "stopMusic",
    "speakerInterrupt",
    "nextSong",
    "previousSong",
    "volumeUp",
    "volumeDown",
    "getInfo",
];

/// Intents active while playing; "play" triggers are disabled to avoid
/// duplicate starts, pause and stop stay reachable
pub const INTENTS_PLAYING: &[&str] = &[
    "pauseMusic",
    "stopMusic",
    "speakerInterrupt",
    "nextSong",
    "previousSong",
    "volumeUp",
    "volumeDown",
    "getInfo",
];

/// Intents active while paused; pausing again makes no sense
pub const INTENTS_PAUSING: &[&str] = &[
    "playMusic",
    "resumeMusic",
    "stopMusic",
    "speakerInterrupt",
    "nextSong",
    "previousSong",
    "volumeUp",
    "volumeDown",
    "getInfo",
];

/// The playback modes the skill can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Context control disabled; every intent always active
    AllEnabled,
    /// Nothing playing yet, or playback stopped
    Init,
    /// Daemon is actively playing
    Playing,
    /// Daemon is paused
    Pausing,
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::AllEnabled => write!(f, "AllEnabled"),
            PlaybackMode::Init => write!(f, "Init"),
            PlaybackMode::Playing => write!(f, "Playing"),
            PlaybackMode::Pausing => write!(f, "Pausing"),
        }
    }
}

/// State machine over playback modes with bus side effects on entry
pub struct ModeController<P: DialogPublisher> {
    mode: PlaybackMode,
    sound_feedback: bool,
    publisher: P,
}

impl<P: DialogPublisher> ModeController<P> {
    /// Create the controller and perform the startup publish.
    ///
    /// With context control disabled the mode is pinned to `AllEnabled`:
    /// the full intent set is published once and nothing ever fires again.
    /// Otherwise the mode starts at `Init` with its intent set published;
    /// the feedback indicator is left alone at startup.
    pub fn start(context_control: bool, sound_feedback: bool, publisher: P) -> Self {
        let mode = if context_control {
            PlaybackMode::Init
        } else {
            PlaybackMode::AllEnabled
        };

        info!(mode = %mode, "mode controller starting");
        publisher.publish_intent_filter(INTENTS_ALL);

        Self {
            mode,
            sound_feedback,
            publisher,
        }
    }

    /// Current mode
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Feed a daemon playback-state report into the state machine
    pub fn handle_player_state(&mut self, event: PlayerEvent) {
        if self.mode == PlaybackMode::AllEnabled {
            return;
        }

        let next = match event {
            PlayerEvent::Playing => self.next_on_playing(),
            PlayerEvent::Pausing => self.next_on_pausing(),
            PlayerEvent::Stopped => self.next_on_stopped(),
            // Lifecycle events are the skill loop's concern
            PlayerEvent::Ready | PlayerEvent::Disconnected => None,
        };

        match next {
            Some(new_mode) if new_mode != self.mode => self.transition_to(new_mode),
            _ => {
                debug!(mode = %self.mode, event = %event, "no mode transition");
            }
        }
    }

    /// Next mode when the daemon reports playing
    fn next_on_playing(&self) -> Option<PlaybackMode> {
        match self.mode {
            PlaybackMode::Init | PlaybackMode::Pausing => Some(PlaybackMode::Playing),
            _ => None,
        }
    }

    /// Next mode when the daemon reports paused
    fn next_on_pausing(&self) -> Option<PlaybackMode> {
        match self.mode {
            PlaybackMode::Playing => Some(PlaybackMode::Pausing),
            // Paused while Init is an undefined edge; ignore it
            _ => None,
        }
    }

    /// Next mode when the daemon reports stopped
    fn next_on_stopped(&self) -> Option<PlaybackMode> {
        match self.mode {
            PlaybackMode::Playing | PlaybackMode::Pausing => Some(PlaybackMode::Init),
            _ => None,
        }
    }

    /// Perform a transition and its entry side effects
    fn transition_to(&mut self, new_mode: PlaybackMode) {
        info!(from = %self.mode, to = %new_mode, "mode transition");
        self.mode = new_mode;

        let (intents, indicator_on) = match new_mode {
            PlaybackMode::Playing => (INTENTS_PLAYING, false),
            PlaybackMode::Pausing => (INTENTS_PAUSING, true),
            PlaybackMode::Init => (INTENTS_ALL, false),
            // Unreachable: AllEnabled is never a transition target
            PlaybackMode::AllEnabled => (INTENTS_ALL, false),
        };

        self.publisher.publish_intent_filter(intents);
        if self.sound_feedback {
            self.publisher.set_feedback_sound(indicator_on);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every publish so tests can count side effects
    #[derive(Clone, Default)]
    struct RecordingPublisher {
        filters: Arc<Mutex<Vec<Vec<String>>>>,
        feedback: Arc<Mutex<Vec<bool>>>,
    }

    impl RecordingPublisher {
        fn filter_count(&self) -> usize {
            self.filters.lock().unwrap().len()
        }

        fn feedback_log(&self) -> Vec<bool> {
            self.feedback.lock().unwrap().clone()
        }

        fn last_filter(&self) -> Vec<String> {
            self.filters.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl DialogPublisher for RecordingPublisher {
        fn publish_intent_filter(&self, intents: &[&str]) {
            self.filters
                .lock()
                .unwrap()
                .push(intents.iter().map(|s| s.to_string()).collect());
        }

        fn set_feedback_sound(&self, on: bool) {
            self.feedback.lock().unwrap().push(on);
        }

        fn announce(&self, _text: &str, _site_id: &str) {}
    }

    fn controller(context_control: bool) -> (ModeController<RecordingPublisher>, RecordingPublisher) {
        let publisher = RecordingPublisher::default();
        let controller = ModeController::start(context_control, true, publisher.clone());
        (controller, publisher)
    }

    #[test]
    fn test_startup_publishes_once() {
        let (controller, publisher) = controller(true);
        assert_eq!(controller.mode(), PlaybackMode::Init);
        assert_eq!(publisher.filter_count(), 1);
        assert!(publisher.feedback_log().is_empty());
    }

    #[test]
    fn test_init_to_playing() {
        let (mut controller, publisher) = controller(true);
        controller.handle_player_state(PlayerEvent::Playing);

        assert_eq!(controller.mode(), PlaybackMode::Playing);
        assert_eq!(publisher.filter_count(), 2);
        let filter = publisher.last_filter();
        assert!(!filter.contains(&"playMusic".to_string()));
        // Pause and stop must stay reachable by voice during playback
        assert!(filter.contains(&"pauseMusic".to_string()));
        assert!(filter.contains(&"stopMusic".to_string()));
        // Indicator off during playback
        assert_eq!(publisher.feedback_log(), vec![false]);
    }

    #[test]
    fn test_playing_to_pausing_turns_indicator_on() {
        let (mut controller, publisher) = controller(true);
        controller.handle_player_state(PlayerEvent::Playing);
        controller.handle_player_state(PlayerEvent::Pausing);

        assert_eq!(controller.mode(), PlaybackMode::Pausing);
        assert_eq!(publisher.feedback_log(), vec![false, true]);
        let filter = publisher.last_filter();
        assert!(filter.contains(&"resumeMusic".to_string()));
        assert!(filter.contains(&"stopMusic".to_string()));
        assert!(!filter.contains(&"pauseMusic".to_string()));
    }

    #[test]
    fn test_stopped_returns_to_init_from_either_mode() {
        let (mut controller, publisher) = controller(true);
        controller.handle_player_state(PlayerEvent::Playing);
        controller.handle_player_state(PlayerEvent::Stopped);
        assert_eq!(controller.mode(), PlaybackMode::Init);
        assert_eq!(publisher.last_filter().len(), INTENTS_ALL.len());

        controller.handle_player_state(PlayerEvent::Playing);
        controller.handle_player_state(PlayerEvent::Pausing);
        controller.handle_player_state(PlayerEvent::Stopped);
        assert_eq!(controller.mode(), PlaybackMode::Init);
    }

    #[test]
    fn test_pausing_back_to_playing() {
        let (mut controller, _) = controller(true);
        controller.handle_player_state(PlayerEvent::Playing);
        controller.handle_player_state(PlayerEvent::Pausing);
        controller.handle_player_state(PlayerEvent::Playing);
        assert_eq!(controller.mode(), PlaybackMode::Playing);
    }

    #[test]
    fn test_duplicate_report_is_idempotent() {
        let (mut controller, publisher) = controller(true);
        controller.handle_player_state(PlayerEvent::Playing);
        let filters = publisher.filter_count();
        let feedback = publisher.feedback_log().len();

        // Same report again: no publish, no toggle
        controller.handle_player_state(PlayerEvent::Playing);
        assert_eq!(controller.mode(), PlaybackMode::Playing);
        assert_eq!(publisher.filter_count(), filters);
        assert_eq!(publisher.feedback_log().len(), feedback);
    }

    #[test]
    fn test_undefined_edge_does_not_corrupt_state() {
        let (mut controller, publisher) = controller(true);
        // Paused while Init is not a defined edge
        controller.handle_player_state(PlayerEvent::Pausing);
        assert_eq!(controller.mode(), PlaybackMode::Init);
        assert_eq!(publisher.filter_count(), 1);

        // The machine still works afterwards
        controller.handle_player_state(PlayerEvent::Playing);
        assert_eq!(controller.mode(), PlaybackMode::Playing);
    }

    #[test]
    fn test_all_enabled_never_reacts() {
        let (mut controller, publisher) = controller(false);
        assert_eq!(controller.mode(), PlaybackMode::AllEnabled);
        assert_eq!(publisher.filter_count(), 1);

        controller.handle_player_state(PlayerEvent::Playing);
        controller.handle_player_state(PlayerEvent::Pausing);
        controller.handle_player_state(PlayerEvent::Stopped);

        assert_eq!(controller.mode(), PlaybackMode::AllEnabled);
        assert_eq!(publisher.filter_count(), 1);
        assert!(publisher.feedback_log().is_empty());
    }

    #[test]
    fn test_feedback_disabled_still_transitions() {
        let publisher = RecordingPublisher::default();
        let mut controller = ModeController::start(true, false, publisher.clone());

        controller.handle_player_state(PlayerEvent::Playing);
        assert_eq!(controller.mode(), PlaybackMode::Playing);
        assert_eq!(publisher.filter_count(), 2);
        assert!(publisher.feedback_log().is_empty());
    }
}
