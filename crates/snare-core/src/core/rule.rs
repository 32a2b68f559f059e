// crates/snare-core/src/core/rule.rs
// ============================================================================
// Module: Snare Rules
// Description: Blocking/tagging rules enforced by the inspection engine.
// Purpose: Define rule structure, invariants, and validation.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Rules are owned by the inspection engine and created by the analysis
//! pipeline. A rule carries a match (string or regex over selected request
//! locations), an action, a confidence, a severity, and evidence plus audit
//! blocks describing its provenance.
//! Invariants:
//! - Priority is within `[50, 180]`.
//! - Confidence is within `[0, 1]` and severity within `[0, 10]`.
//! - A `block` action requires confidence of at least `0.75`.
//! - Mutations after creation are limited to `enabled` and `expires_at`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::RuleId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Lowest admissible rule priority.
pub const MIN_RULE_PRIORITY: i32 = 50;
/// Highest admissible rule priority.
pub const MAX_RULE_PRIORITY: i32 = 180;
/// Minimum confidence required for a blocking rule.
pub const MIN_BLOCK_CONFIDENCE: f64 = 0.75;

// ============================================================================
// SECTION: Match Definition
// ============================================================================

/// Rule pattern kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Literal substring match.
    String,
    /// Regular-expression match.
    Regex,
}

/// Request locations a rule may be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLocation {
    /// Request URI path.
    Uri,
    /// Query arguments.
    Args,
    /// Request body.
    Body,
    /// Request headers.
    Headers,
    /// Values inside JSON bodies.
    JsonValues,
}

/// Pattern and scope of a rule match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Pattern kind.
    pub kind: MatchKind,
    /// Literal or regex pattern text.
    pub pattern: String,
    /// Locations the pattern applies to.
    pub locations: Vec<MatchLocation>,
    /// Case-insensitive matching for regex patterns.
    #[serde(default)]
    pub caseless: bool,
}

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Action taken when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Reject the request outright.
    Block,
    /// Challenge the client (rate limit or interactive check).
    Challenge,
    /// Tag the session for observation.
    Tag,
    /// Explicitly allow.
    Allow,
}

impl RuleAction {
    /// Returns a stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Challenge => "challenge",
            Self::Tag => "tag",
            Self::Allow => "allow",
        }
    }
}

// ============================================================================
// SECTION: Provenance
// ============================================================================

/// Evidence block describing where a rule came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuleEvidence {
    /// Originating simulation identifier.
    #[serde(default)]
    pub simulation_id: Option<String>,
    /// Sample payloads the rule was synthesized from.
    #[serde(default)]
    pub sample_payloads: Vec<String>,
    /// Attack type label (sql_injection, xss, ...).
    #[serde(default)]
    pub attack_type: Option<String>,
}

/// Audit block recording issuance context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RuleAudit {
    /// Issuing component label.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Simulation verdict the rule derives from.
    #[serde(default)]
    pub source_verdict: Option<String>,
    /// Attacker TTP identifiers observed in the source session.
    #[serde(default)]
    pub attacker_ttps: Vec<String>,
}

// ============================================================================
// SECTION: Rule
// ============================================================================

/// A rule enforced by the inspection engine.
///
/// # Invariants
/// - See the module overview; `validate` enforces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable rule identifier.
    pub rule_id: RuleId,
    /// Evaluation priority (ascending order, `[50, 180]`).
    pub priority: i32,
    /// Pattern and scope.
    #[serde(rename = "match")]
    pub matcher: RuleMatch,
    /// Action on match.
    pub action: RuleAction,
    /// Confidence that the rule identifies its attack class, `[0, 1]`.
    pub confidence: f64,
    /// Severity of the attack class, `[0, 10]`.
    pub severity: f64,
    /// Whether the rule participates in inspection.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Provenance evidence.
    #[serde(default)]
    pub evidence: RuleEvidence,
    /// Issuance audit metadata.
    #[serde(default)]
    pub audit: RuleAudit,
    /// Optional expiry instant; expired rules are dropped on read.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

/// Serde default for the `enabled` flag.
const fn default_enabled() -> bool {
    true
}

/// Errors raised when validating a rule.
#[derive(Debug, Error, PartialEq)]
pub enum RuleValidationError {
    /// Priority outside the admissible band.
    #[error("rule priority {0} outside [{MIN_RULE_PRIORITY}, {MAX_RULE_PRIORITY}]")]
    PriorityOutOfRange(i32),
    /// Confidence outside `[0, 1]`.
    #[error("rule confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    /// Severity outside `[0, 10]`.
    #[error("rule severity {0} outside [0, 10]")]
    SeverityOutOfRange(f64),
    /// Blocking rule below the confidence floor.
    #[error("block action requires confidence >= {MIN_BLOCK_CONFIDENCE}, got {0}")]
    BlockConfidenceTooLow(f64),
    /// Pattern is empty.
    #[error("rule pattern must not be empty")]
    EmptyPattern,
    /// No match locations configured.
    #[error("rule must declare at least one match location")]
    NoLocations,
}

impl Rule {
    /// Validates the rule invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RuleValidationError`] describing the first violation found.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if !(MIN_RULE_PRIORITY ..= MAX_RULE_PRIORITY).contains(&self.priority) {
            return Err(RuleValidationError::PriorityOutOfRange(self.priority));
        }
        if !(0.0 ..= 1.0).contains(&self.confidence) {
            return Err(RuleValidationError::ConfidenceOutOfRange(self.confidence));
        }
        if !(0.0 ..= 10.0).contains(&self.severity) {
            return Err(RuleValidationError::SeverityOutOfRange(self.severity));
        }
        if self.action == RuleAction::Block && self.confidence < MIN_BLOCK_CONFIDENCE {
            return Err(RuleValidationError::BlockConfidenceTooLow(self.confidence));
        }
        if self.matcher.pattern.is_empty() {
            return Err(RuleValidationError::EmptyPattern);
        }
        if self.matcher.locations.is_empty() {
            return Err(RuleValidationError::NoLocations);
        }
        Ok(())
    }

    /// Returns true when the rule has expired at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expiry| now > expiry)
    }
}
