// crates/snare-core/src/core/pin.rs
// ============================================================================
// Module: Snare Session Pins
// Description: TTL-bounded pins binding fingerprints to a routing target.
// Purpose: Define the pin record shared by the router and its stores.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A pin binds a session fingerprint to a routing target for a bounded time.
//! Invariants:
//! - At most one active pin exists per fingerprint.
//! - A pin past `pinned_until` is removed the first time it is read; a
//!   missing pin is indistinguishable from a lazily evicted one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::Fingerprint;
use crate::core::identifiers::SessionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Route Target
// ============================================================================

/// Backends a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// The production backend.
    Production,
    /// The high-interaction decoy.
    Decoy,
}

impl RouteTarget {
    /// Returns a stable label for the target.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Decoy => "decoy",
        }
    }
}

// ============================================================================
// SECTION: Pin
// ============================================================================

/// A TTL-bounded routing pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    /// Fingerprint the pin is keyed by.
    pub fingerprint: Fingerprint,
    /// Session identifier the pin was created for.
    pub session_id: SessionId,
    /// Client IP observed at pin time.
    pub client_ip: String,
    /// Routing target while the pin is live.
    pub target: RouteTarget,
    /// Instant the pin was created.
    pub pinned_at: Timestamp,
    /// Instant the pin expires.
    pub pinned_until: Timestamp,
    /// Reason the pin was created.
    pub reason: String,
}

impl Pin {
    /// Returns true when the pin is still live at the given instant.
    #[must_use]
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        now <= self.pinned_until
    }
}
