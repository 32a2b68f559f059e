// crates/snare-core/tests/identifiers.rs
// ============================================================================
// Module: Identifier Tests
// Description: Tests for fingerprint validation and id generation.
// Purpose: Validate the canonical fingerprint shape.
// Dependencies: snare-core
// ============================================================================
//! ## Overview
//! Fingerprints must be exactly sixteen lowercase hex digits; anything else
//! is rejected at construction.

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

use snare_core::EventId;
use snare_core::Fingerprint;
use snare_core::JobId;
use snare_core::RuleId;

/// Verifies a canonical fingerprint is accepted.
#[test]
fn fingerprint_accepts_sixteen_lowercase_hex() {
    let fingerprint = Fingerprint::from_hex("0123456789abcdef").unwrap();
    assert_eq!(fingerprint.as_str(), "0123456789abcdef");
}

/// Verifies malformed fingerprints are rejected.
#[test]
fn fingerprint_rejects_bad_shapes() {
    assert!(Fingerprint::from_hex("0123").is_err());
    assert!(Fingerprint::from_hex("0123456789ABCDEF").is_err());
    assert!(Fingerprint::from_hex("0123456789abcdeg").is_err());
    assert!(Fingerprint::from_hex("0123456789abcdef0").is_err());
}

/// Verifies digest-prefix truncation yields a valid fingerprint.
#[test]
fn fingerprint_from_digest_prefix_truncates() {
    let digest = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";
    let fingerprint = Fingerprint::from_digest_prefix(digest).unwrap();
    assert_eq!(fingerprint.as_str(), "deadbeefdeadbeef");
}

/// Verifies generated ids carry their prefixes and are unique.
#[test]
fn generated_ids_carry_prefixes() {
    assert!(EventId::generate().as_str().starts_with("evt_"));
    assert!(RuleId::generate().as_str().starts_with("rule_"));
    assert!(JobId::generate().as_str().starts_with("sim_"));
    assert_ne!(EventId::generate(), EventId::generate());
}
