// crates/snare-core/src/core/identifiers.rs
// ============================================================================
// Module: Snare Identifiers
// Description: Canonical opaque identifiers for Snare events, sessions, and rules.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Snare. Identifiers are opaque and serialize as strings. Fingerprints are
//! the one exception: they are validated to be exactly sixteen lowercase hex
//! digits because pin-map correctness depends on a stable canonical form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Event identifier keying evidence packages and bus messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new event identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random event identifier with the `evt_` prefix.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("evt_{}", short_uuid()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Capture identifier scoped to one evidence package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureId(String);

impl CaptureId {
    /// Creates a new capture identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random capture identifier with the `cap_` prefix.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("cap_{}", short_uuid()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Session identifier as presented by clients (opaque).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Rule identifier owned by the inspection engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random rule identifier with the `rule_` prefix.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("rule_{}", short_uuid()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Simulation job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a new job identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random job identifier with the `sim_` prefix.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("sim_{}", short_uuid()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// Errors raised when constructing a fingerprint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    /// The value is not exactly sixteen lowercase hex digits.
    #[error("fingerprint must be 16 lowercase hex digits, got {0:?}")]
    InvalidFormat(String),
}

/// Stable sixteen-hex-digit session fingerprint.
///
/// # Invariants
/// - The inner string is exactly sixteen lowercase hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

/// Required fingerprint length in hex characters.
pub const FINGERPRINT_HEX_LENGTH: usize = 16;

impl Fingerprint {
    /// Creates a fingerprint from a sixteen-hex-digit string.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::InvalidFormat`] for any other shape.
    pub fn from_hex(value: impl Into<String>) -> Result<Self, FingerprintError> {
        let value = value.into();
        let valid = value.len() == FINGERPRINT_HEX_LENGTH
            && value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        if valid {
            Ok(Self(value))
        } else {
            Err(FingerprintError::InvalidFormat(value))
        }
    }

    /// Builds a fingerprint by truncating a lowercase hex digest.
    ///
    /// Digests shorter than sixteen characters are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::InvalidFormat`] when the digest is too
    /// short or not lowercase hex.
    pub fn from_digest_prefix(digest_hex: &str) -> Result<Self, FingerprintError> {
        let prefix = digest_hex.get(.. FINGERPRINT_HEX_LENGTH).unwrap_or(digest_hex);
        Self::from_hex(prefix)
    }

    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the first twelve hex characters of a fresh UUID.
fn short_uuid() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw.chars().take(12).collect()
}
