// crates/snare-core/src/core/evidence.rs
// ============================================================================
// Module: Snare Evidence Pointers
// Description: Evidence pointers and payload artifacts crossing the bus.
// Purpose: Define the lightweight records that reference stored packages.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`EvidencePointer`] is the only object that crosses the message bus;
//! the package itself stays in the object store. Pointers carry the package
//! location and integrity checksum so consumers can validate downloads.
//! Delivery is at-least-once; consumers must be idempotent keyed by event id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::CaptureId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::SessionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Payload Artifacts
// ============================================================================

/// Attack payload classes recognized by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// SQL injection.
    SqlInjection,
    /// Cross-site scripting.
    Xss,
    /// OS command injection.
    CommandInjection,
    /// Directory traversal.
    PathTraversal,
    /// Malicious file upload.
    FileUpload,
    /// XML external entity injection.
    Xxe,
    /// Unclassified payload.
    Unknown,
}

impl PayloadKind {
    /// Returns a stable label for the payload kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SqlInjection => "sql_injection",
            Self::Xss => "xss",
            Self::CommandInjection => "command_injection",
            Self::PathTraversal => "path_traversal",
            Self::FileUpload => "file_upload",
            Self::Xxe => "xxe",
            Self::Unknown => "unknown",
        }
    }
}

/// An extracted malicious payload captured during a decoy session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadArtifact {
    /// Artifact identifier within the package (payload_000, ...).
    pub artifact_id: String,
    /// Payload classification.
    pub payload_type: PayloadKind,
    /// Raw payload content.
    pub payload_value: String,
    /// Where the payload was found (query.id, body.username, ...).
    pub location: String,
    /// Extraction confidence, `[0, 1]`.
    pub confidence: f64,
    /// Package-relative file path when persisted as an artifact file.
    #[serde(default)]
    pub file_path: Option<String>,
    /// SHA-256 of the payload content.
    pub checksum: HashDigest,
}

// ============================================================================
// SECTION: Evidence Pointer
// ============================================================================

/// Lightweight pointer announcing a stored evidence package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePointer {
    /// Event identifier keying the package and its bus partition.
    pub event_id: EventId,
    /// Capture identifier within the package.
    pub capture_id: CaptureId,
    /// Session the evidence was captured from.
    pub session_id: SessionId,
    /// Attacker IP recorded at capture time.
    pub attacker_ip: String,
    /// Object-store URL of the package prefix (`s3://bucket/event_id/`).
    pub location: String,
    /// Number of payload artifacts in the package.
    pub payload_count: usize,
    /// Number of HAR entries in the package.
    pub request_count: usize,
    /// Package checksum for download validation.
    pub checksum: HashDigest,
    /// Classification tags carried from capture.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Publication instant.
    pub timestamp: Timestamp,
}
