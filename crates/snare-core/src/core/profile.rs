// crates/snare-core/src/core/profile.rs
// ============================================================================
// Module: Snare Attacker Profiles
// Description: Behavioral profile of one captured attacker session.
// Purpose: Define the profile record produced by the analysis pipeline.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`AttackerProfile`] summarizes one captured session: the ordered action
//! sequence, inferred intent, sophistication, deduplicated MITRE TTPs, and
//! session shape. Re-profiling the same input yields the same profile.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Intent
// ============================================================================

/// Inferred primary intent of an attacker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackIntent {
    /// Mapping the application surface.
    Reconnaissance,
    /// Actively exploiting vulnerabilities.
    Exploitation,
    /// Extracting data.
    DataExfiltration,
    /// Seeking elevated access.
    PrivilegeEscalation,
    /// No dominant pattern.
    Unknown,
}

impl AttackIntent {
    /// Returns a stable label for the intent.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reconnaissance => "reconnaissance",
            Self::Exploitation => "exploitation",
            Self::DataExfiltration => "data_exfiltration",
            Self::PrivilegeEscalation => "privilege_escalation",
            Self::Unknown => "unknown",
        }
    }
}

// ============================================================================
// SECTION: Profile
// ============================================================================

/// Behavioral profile of one attacker session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackerProfile {
    /// Session the profile describes.
    pub session_id: SessionId,
    /// Ordered classified action sequence.
    pub action_sequence: Vec<String>,
    /// Inferred primary intent.
    pub intent: AttackIntent,
    /// Sophistication score, `[0, 10]`.
    pub sophistication: f64,
    /// Deduplicated, sorted MITRE ATT&CK technique identifiers.
    pub ttps: Vec<String>,
    /// Count of distinct endpoints touched.
    pub unique_endpoints: usize,
    /// Session duration in seconds.
    pub duration_seconds: f64,
    /// Human-readable summary.
    pub summary: String,
    /// Cluster assignment when session clustering has run (-1 = noise).
    #[serde(default)]
    pub cluster_id: Option<i32>,
}
