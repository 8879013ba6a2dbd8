//! Intent dispatch core
//!
//! Every recognition event goes through the confidence gate first; admitted
//! events are routed by intent name to their handler, tagged with the
//! playback mode current at dispatch time. Exactly one dispatch per
//! admitted event. A failing handler is an external defect and is isolated
//! here: it is logged and the next event proceeds untouched.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use crate::events::RecognitionEvent;
use crate::gate::{self, ConfidenceThresholds, DropReason, GateDecision};
use crate::mode::PlaybackMode;

/// What a handler did with an admitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The handler acted on the event
    Handled,
    /// The handler intentionally produced no response
    NoOp,
}

/// Per-dispatch result, for observability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    NoOp,
    /// No handler registered under the event's intent name
    UnknownIntent,
    /// The gate refused the event
    Dropped(DropReason),
    /// The handler returned an error; isolated, not fatal
    HandlerFailed,
}

/// A per-intent command handler.
///
/// Handlers are external collaborators; this core only defines the seam.
pub trait IntentHandler: Send {
    fn handle(&mut self, event: &RecognitionEvent, mode: PlaybackMode) -> Result<HandlerOutcome>;
}

/// Gates and routes recognition events
pub struct IntentDispatchCore {
    thresholds: ConfidenceThresholds,
    handlers: HashMap<String, Box<dyn IntentHandler>>,
}

impl IntentDispatchCore {
    pub fn new(thresholds: ConfidenceThresholds) -> Self {
        Self {
            thresholds,
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for an intent name
    pub fn register(&mut self, intent: impl Into<String>, handler: Box<dyn IntentHandler>) {
        self.handlers.insert(intent.into(), handler);
    }

    /// Gate one event and, if admitted, invoke its handler
    pub fn dispatch(&mut self, event: &RecognitionEvent, mode: PlaybackMode) -> DispatchOutcome {
        match gate::admit(event, &self.thresholds) {
            GateDecision::Drop(reason) => {
                debug!(intent = %event.intent, ?reason, "recognition event dropped");
                DispatchOutcome::Dropped(reason)
            }
            GateDecision::Admit => match self.handlers.get_mut(&event.intent) {
                None => {
                    debug!(intent = %event.intent, "unknown intent discarded");
                    DispatchOutcome::UnknownIntent
                }
                Some(handler) => match handler.handle(event, mode) {
                    Ok(HandlerOutcome::Handled) => DispatchOutcome::Handled,
                    Ok(HandlerOutcome::NoOp) => DispatchOutcome::NoOp,
                    Err(e) => {
                        warn!(intent = %event.intent, ?e, "intent handler failed");
                        DispatchOutcome::HandlerFailed
                    }
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CallLog {
        calls: Arc<Mutex<Vec<(String, PlaybackMode)>>>,
    }

    struct OkHandler {
        log: CallLog,
    }

    impl IntentHandler for OkHandler {
        fn handle(
            &mut self,
            event: &RecognitionEvent,
            mode: PlaybackMode,
        ) -> Result<HandlerOutcome> {
            self.log
                .calls
                .lock()
                .unwrap()
                .push((event.intent.clone(), mode));
            Ok(HandlerOutcome::Handled)
        }
    }

    struct FailingHandler;

    impl IntentHandler for FailingHandler {
        fn handle(&mut self, _: &RecognitionEvent, _: PlaybackMode) -> Result<HandlerOutcome> {
            anyhow::bail!("handler blew up")
        }
    }

    fn event(intent: &str, intent_conf: f32, asr_conf: f32) -> RecognitionEvent {
        RecognitionEvent {
            intent: intent.to_string(),
            intent_confidence: intent_conf,
            asr_confidence: asr_conf,
            slots: Vec::new(),
            site_id: "default".to_string(),
        }
    }

    fn core_with_handler(log: &CallLog) -> IntentDispatchCore {
        let mut core = IntentDispatchCore::new(ConfidenceThresholds::default());
        core.register("pauseMusic", Box::new(OkHandler { log: log.clone() }));
        core
    }

    #[test]
    fn test_admitted_event_reaches_handler_with_mode() {
        let log = CallLog::default();
        let mut core = core_with_handler(&log);

        let outcome = core.dispatch(&event("pauseMusic", 0.9, 0.9), PlaybackMode::Playing);
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(
            log.calls.lock().unwrap().as_slice(),
            &[("pauseMusic".to_string(), PlaybackMode::Playing)]
        );
    }

    #[test]
    fn test_dropped_event_never_reaches_handler() {
        let log = CallLog::default();
        let mut core = core_with_handler(&log);

        let outcome = core.dispatch(&event("pauseMusic", 0.9, 0.1), PlaybackMode::Init);
        assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::LowAsrConfidence));
        assert!(log.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_intent_is_nonfatal() {
        let log = CallLog::default();
        let mut core = core_with_handler(&log);

        let outcome = core.dispatch(&event("orderPizza", 0.9, 0.9), PlaybackMode::Init);
        assert_eq!(outcome, DispatchOutcome::UnknownIntent);
    }

    #[test]
    fn test_handler_error_is_isolated() {
        let log = CallLog::default();
        let mut core = core_with_handler(&log);
        core.register("stopMusic", Box::new(FailingHandler));

        let outcome = core.dispatch(&event("stopMusic", 0.9, 0.9), PlaybackMode::Playing);
        assert_eq!(outcome, DispatchOutcome::HandlerFailed);

        // Subsequent events still dispatch normally
        let outcome = core.dispatch(&event("pauseMusic", 0.9, 0.9), PlaybackMode::Playing);
        assert_eq!(outcome, DispatchOutcome::Handled);
    }

    #[test]
    fn test_noop_outcome_surfaces() {
        struct NoOpHandler;
        impl IntentHandler for NoOpHandler {
            fn handle(&mut self, _: &RecognitionEvent, _: PlaybackMode) -> Result<HandlerOutcome> {
                Ok(HandlerOutcome::NoOp)
            }
        }

        let mut core = IntentDispatchCore::new(ConfidenceThresholds::default());
        core.register("speakerInterrupt", Box::new(NoOpHandler));

        let outcome = core.dispatch(&event("speakerInterrupt", 0.9, 0.9), PlaybackMode::Init);
        assert_eq!(outcome, DispatchOutcome::NoOp);
    }
}
