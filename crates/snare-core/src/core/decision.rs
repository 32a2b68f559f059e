// crates/snare-core/src/core/decision.rs
// ============================================================================
// Module: Snare Inspection Decisions
// Description: Score breakdown and decision emitted per inspected request.
// Purpose: Define the inspection engine's output contract.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each inspection produces a [`Decision`]: an action, the score breakdown,
//! tags, and a human-readable reason. When a session is tagged as a person
//! of interest, the decision also carries the identifier of the emitted POI
//! event so callers can correlate downstream evidence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Scores
// ============================================================================

/// Weight of the rule score in the combined score.
pub const COMBINED_RULE_WEIGHT: f64 = 0.4;
/// Weight of the ML score (scaled to 0-100) in the combined score.
pub const COMBINED_ML_WEIGHT: f64 = 40.0;
/// Weight of the behavioral score (scaled to 0-100) in the combined score.
pub const COMBINED_BEHAVIORAL_WEIGHT: f64 = 20.0;

/// Per-request score breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Rule-match score, `[0, 100]`.
    pub rule: f64,
    /// ML anomaly score, `[0, 1]`.
    pub ml: f64,
    /// Behavioral score, `[0, 1]`.
    pub behavioral: f64,
    /// Combined threat score, `[0, 100]`.
    pub combined: f64,
}

impl ScoreBreakdown {
    /// Combines the component scores into the clamped overall score.
    #[must_use]
    pub fn combine(rule: f64, ml: f64, behavioral: f64) -> Self {
        let combined = COMBINED_ML_WEIGHT.mul_add(
            ml,
            COMBINED_RULE_WEIGHT.mul_add(rule, COMBINED_BEHAVIORAL_WEIGHT * behavioral),
        );
        Self {
            rule,
            ml,
            behavioral,
            combined: combined.clamp(0.0, 100.0),
        }
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Actions the inspection engine can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Pass the request through.
    Allow,
    /// Reject the request.
    Block,
    /// Tag the session as a person of interest.
    TagPoi,
}

impl DecisionAction {
    /// Returns a stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Block => "block",
            Self::TagPoi => "tag_poi",
        }
    }
}

/// Outcome of one inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Chosen action.
    pub action: DecisionAction,
    /// Session the request belongs to.
    pub session_id: SessionId,
    /// Score breakdown behind the action.
    pub scores: ScoreBreakdown,
    /// Classification tags (signature_match, poi, ml_anomaly, ...).
    pub tags: Vec<String>,
    /// Human-readable reason.
    pub reason: String,
    /// Identifier of the emitted POI event, when the action is `tag_poi`.
    #[serde(default)]
    pub event_id: Option<EventId>,
}
