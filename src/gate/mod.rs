//! Confidence-based admission control for recognition events
//!
//! A pure decision function: given an event and the configured thresholds,
//! either admit it to dispatch or drop it with a reason. No side effects,
//! deterministic for identical inputs.

use crate::events::RecognitionEvent;

/// Minimum confidences a recognition event must clear, read-only for the
/// lifetime of the process
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceThresholds {
    /// Minimum intent confidence accepted outright
    pub intent_standard: f32,

    /// Intent confidence below this is rejected regardless of slots
    pub intent_drop: f32,

    /// Minimum confidence for each extracted slot value
    pub slot_drop: f32,

    /// Minimum confidence for the underlying speech-to-text result
    pub asr_drop: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            intent_standard: 0.5,
            intent_drop: 0.3,
            slot_drop: 0.4,
            asr_drop: 0.5,
        }
    }
}

/// Why an event was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Speech-to-text result too uncertain to trust anything downstream
    LowAsrConfidence,

    /// Intent classification below the hard floor
    LowIntentConfidence,

    /// A slot value was extracted with too little confidence
    LowSlotConfidence { slot: String },

    /// Intent classified above the floor but under the standard threshold
    BelowStandardConfidence,
}

/// Outcome of gating a single event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Admit,
    Drop(DropReason),
}

/// Evaluate an event against the thresholds.
///
/// Checks apply in a fixed precedence order; the first failing check
/// decides the drop reason.
pub fn admit(event: &RecognitionEvent, thresholds: &ConfidenceThresholds) -> GateDecision {
    if event.asr_confidence < thresholds.asr_drop {
        return GateDecision::Drop(DropReason::LowAsrConfidence);
    }

    if event.intent_confidence < thresholds.intent_drop {
        return GateDecision::Drop(DropReason::LowIntentConfidence);
    }

    for slot in &event.slots {
        if slot.confidence < thresholds.slot_drop {
            return GateDecision::Drop(DropReason::LowSlotConfidence {
                slot: slot.name.clone(),
            });
        }
    }

    // Kept as its own branch: a soft-admission policy with a confirmation
    // prompt would replace this drop without touching the checks above.
    if event.intent_confidence < thresholds.intent_standard {
        return GateDecision::Drop(DropReason::BelowStandardConfidence);
    }

    GateDecision::Admit
}
