// crates/snare-evidence/src/package.rs
// ============================================================================
// Module: Snare Evidence Package Metadata
// Description: Metadata records stored alongside a captured session.
// Purpose: Define the authoritative manifest of an evidence package.
// Dependencies: snare-core, serde
// ============================================================================

//! ## Overview
//! `metadata.json` is the authoritative manifest of an evidence package. It
//! carries the session window bounds, counts, fingerprint, tags, the payload
//! artifact list (whose contents are also persisted as files under
//! `payloads/`), and the package storage location.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use snare_core::AttackerProfile;
use snare_core::CaptureId;
use snare_core::EventId;
use snare_core::PayloadArtifact;
use snare_core::SessionId;
use snare_core::Timestamp;

// ============================================================================
// SECTION: Session Metadata
// ============================================================================

/// Metadata about the captured attacker session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Session identifier.
    pub session_id: SessionId,
    /// Attacker IP address.
    pub attacker_ip: String,
    /// Attacker user agent.
    pub user_agent: String,
    /// Session fingerprint (sixteen hex digits).
    pub fingerprint: String,
    /// Capture window start.
    pub session_start: Timestamp,
    /// Capture window end.
    pub session_end: Timestamp,
    /// Number of captured request/response pairs.
    pub request_count: usize,
    /// Total capture duration in milliseconds.
    pub total_duration_ms: i64,
    /// Classification tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

// ============================================================================
// SECTION: Uploaded Files
// ============================================================================

/// Metadata about a file uploaded by the attacker during the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    /// Original filename as presented by the attacker.
    pub filename: String,
    /// File size in bytes.
    pub size: usize,
    /// SHA-256 of the file contents.
    pub checksum: String,
}

// ============================================================================
// SECTION: Evidence Metadata
// ============================================================================

/// Authoritative manifest of one evidence package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    /// Event identifier keying the package.
    pub event_id: EventId,
    /// Capture identifier.
    pub capture_id: CaptureId,
    /// Manifest creation instant.
    pub created_at: Timestamp,
    /// Creating component label.
    pub created_by: String,
    /// Session metadata.
    pub session_metadata: SessionMetadata,
    /// Behavior profile, when profiling ran before packaging.
    #[serde(default)]
    pub behavior_profile: Option<AttackerProfile>,
    /// Payload artifacts captured in the session.
    #[serde(default)]
    pub payloads: Vec<PayloadArtifact>,
    /// Uploaded file records.
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFileRecord>,
    /// Object-store URL of the package prefix.
    pub storage_location: String,
    /// Classification tags.
    #[serde(default)]
    pub tags: Vec<String>,
}
