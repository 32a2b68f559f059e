// crates/snare-core/src/core/verdict.rs
// ============================================================================
// Module: Snare Simulation Verdicts
// Description: Sandbox detonation verdicts and policy outcomes.
// Purpose: Define the analysis pipeline's detonation and policy contracts.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SimulationVerdict`] records what happened when a captured payload was
//! detonated against the shadow application, including container evidence and
//! reproduction steps. A [`PolicyOutcome`] is the orchestrator's disposition
//! for a synthesized rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::evidence::PayloadArtifact;
use crate::core::evidence::PayloadKind;
use crate::core::identifiers::JobId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Detonation verdict classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// The payload demonstrably exploits the shadow application.
    ExploitPossible,
    /// No exploitation was observed.
    ExploitImprobable,
    /// The simulation itself failed.
    Error,
}

impl VerdictKind {
    /// Returns a stable label for the verdict.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExploitPossible => "exploit_possible",
            Self::ExploitImprobable => "exploit_improbable",
            Self::Error => "error",
        }
    }
}

/// Evidence collected from the sandbox during detonation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DetonationEvidence {
    /// Trailing container log output.
    #[serde(default)]
    pub container_logs: String,
    /// Probe stdout.
    #[serde(default)]
    pub stdout: String,
    /// Probe stderr.
    #[serde(default)]
    pub stderr: String,
    /// Probe exit code when available.
    #[serde(default)]
    pub exit_code: Option<i64>,
}

/// Result of detonating one payload in an isolated sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationVerdict {
    /// Verdict class.
    pub verdict: VerdictKind,
    /// Severity, `[0, 10]` (zero unless exploitation was observed).
    pub severity: f64,
    /// Attack type the payload was classified as.
    pub attack_type: PayloadKind,
    /// Evidence captured from the sandbox.
    pub evidence: DetonationEvidence,
    /// Steps to reproduce the detonation.
    pub reproduction_steps: Vec<String>,
    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Error description when the verdict is `error`.
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Simulation Jobs
// ============================================================================

/// Lifecycle states of a queued simulation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker.
    Queued,
    /// Detonating in a sandbox.
    Running,
    /// Finished with a verdict.
    Completed,
    /// Failed before producing a verdict.
    Failed,
}

impl JobStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Stored record of one simulation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Job identifier.
    pub job_id: JobId,
    /// Job lifecycle status.
    pub status: JobStatus,
    /// Payload queued for detonation.
    pub payload: PayloadArtifact,
    /// Shadow application reference (branch or image tag).
    pub shadow_ref: String,
    /// Queueing instant.
    pub queued_at: Timestamp,
    /// Completion instant, once terminal.
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    /// Verdict, once completed.
    #[serde(default)]
    pub verdict: Option<SimulationVerdict>,
    /// Failure description, once failed.
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Policy Outcome
// ============================================================================

/// Orchestrator disposition for a synthesized rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyOutcome {
    /// Pushed to the inspection engine automatically.
    AutoApplied,
    /// Stored and queued for human review.
    PendingReview,
    /// Stored for analysis only.
    LoggedOnly,
}

impl PolicyOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoApplied => "auto_applied",
            Self::PendingReview => "pending_review",
            Self::LoggedOnly => "logged_only",
        }
    }
}
