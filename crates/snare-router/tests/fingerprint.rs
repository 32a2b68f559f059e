// crates/snare-router/tests/fingerprint.rs
// ============================================================================
// Module: Fingerprint Tests
// Description: Tests for fingerprint derivation and priority.
// Purpose: Validate stability and the derivation priority chain.
// Dependencies: snare-router, snare-core
// ============================================================================
//! ## Overview
//! Fingerprint derivation is a pure function: the same identity material
//! yields the same sixteen-hex fingerprint on every call and every host.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use snare_core::SessionId;
use snare_core::hashing::hash_hex;
use snare_router::derive_fingerprint;
use snare_router::request_fingerprint;

/// Verifies derivation matches the truncated SHA-256 of `session:ip`.
#[test]
fn derivation_matches_truncated_sha256() {
    let session = SessionId::new("sess_02");
    let fingerprint = derive_fingerprint(&session, "203.0.113.50");
    let expected = hash_hex(b"sess_02:203.0.113.50");
    assert_eq!(fingerprint.as_str(), &expected[.. 16]);
}

/// Verifies derivation is stable across calls.
#[test]
fn derivation_is_stable() {
    let session = SessionId::new("sess_stable");
    let first = derive_fingerprint(&session, "192.0.2.1");
    let second = derive_fingerprint(&session, "192.0.2.1");
    assert_eq!(first, second);
    assert_ne!(first, derive_fingerprint(&session, "192.0.2.2"));
}

/// Verifies the derivation priority chain for routing queries.
#[test]
fn request_fingerprint_priority_chain() {
    let session = SessionId::new("explicit");
    let cookies = BTreeMap::from([("session_id".to_string(), "cookie-session".to_string())]);

    // Explicit session id wins over everything else.
    let explicit =
        request_fingerprint(Some(&session), "192.0.2.9", "ua", &cookies, Some("token"));
    assert_eq!(explicit, derive_fingerprint(&session, "192.0.2.9"));

    // Session cookie is next.
    let cookie = request_fingerprint(None, "192.0.2.9", "ua", &cookies, Some("token"));
    assert_eq!(cookie, derive_fingerprint(&SessionId::new("cookie-session"), "192.0.2.9"));

    // Bearer token hash is next.
    let bearer = request_fingerprint(None, "192.0.2.9", "ua", &BTreeMap::new(), Some("token"));
    assert_eq!(bearer.as_str(), &hash_hex(b"token")[.. 16]);

    // IP and user agent are the fallback.
    let fallback = request_fingerprint(None, "192.0.2.9", "ua", &BTreeMap::new(), None);
    assert_eq!(fallback.as_str(), &hash_hex(b"192.0.2.9:ua")[.. 16]);
}
