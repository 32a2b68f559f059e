// crates/snare-router/src/fingerprint.rs
// ============================================================================
// Module: Snare Fingerprints
// Description: Stable fingerprint derivation for session routing.
// Purpose: Map session identity material to a sixteen-hex fingerprint.
// Dependencies: snare-core, sha2
// ============================================================================

//! ## Overview
//! Fingerprints are the first sixteen hex digits of SHA-256 over the
//! identity material. Derivation is a pure function, so fingerprints are
//! stable across processes and hosts.
//! Derivation priority for routing: explicit session id, then the session
//! cookie, then the bearer token hash, then the `ip:user_agent` hash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use snare_core::Fingerprint;
use snare_core::SessionId;
use snare_core::hashing::hash_hex;

// ============================================================================
// SECTION: Derivation
// ============================================================================

/// Derives the canonical fingerprint for a session id and client IP.
#[must_use]
pub fn derive_fingerprint(session_id: &SessionId, client_ip: &str) -> Fingerprint {
    truncated_hash(&format!("{}:{client_ip}", session_id.as_str()))
}

/// Derives the fingerprint for a routing query.
///
/// Priority: explicit session id, `session_id` cookie, bearer token hash,
/// and finally the `ip:user_agent` hash.
#[must_use]
pub fn request_fingerprint(
    session_id: Option<&SessionId>,
    client_ip: &str,
    user_agent: &str,
    cookies: &BTreeMap<String, String>,
    bearer_token: Option<&str>,
) -> Fingerprint {
    if let Some(session_id) = session_id {
        return derive_fingerprint(session_id, client_ip);
    }
    if let Some(cookie_session) = cookies.get("session_id") {
        return derive_fingerprint(&SessionId::new(cookie_session.clone()), client_ip);
    }
    if let Some(token) = bearer_token {
        return truncated_hash(token);
    }
    truncated_hash(&format!("{client_ip}:{user_agent}"))
}

/// First sixteen hex digits of SHA-256 over the input.
fn truncated_hash(input: &str) -> Fingerprint {
    let digest = hash_hex(input.as_bytes());
    #[allow(
        clippy::unwrap_used,
        reason = "a sha-256 hex digest always yields a valid 16-hex prefix"
    )]
    Fingerprint::from_digest_prefix(&digest).unwrap()
}
