// crates/snare-router/tests/proptest_fingerprint.rs
// ============================================================================
// Module: Fingerprint Property Tests
// Description: Property tests for fingerprint derivation.
// Purpose: Validate shape and purity for arbitrary identity material.
// Dependencies: snare-router, snare-core, proptest
// ============================================================================
//! ## Overview
//! For any session id and client IP string, derivation yields sixteen
//! lowercase hex digits and is a pure function of its inputs.

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

use proptest::prelude::*;
use snare_core::SessionId;
use snare_router::derive_fingerprint;

proptest! {
    /// Derivation always yields sixteen lowercase hex digits.
    #[test]
    fn fingerprint_shape_holds(session in ".{0,64}", ip in ".{0,64}") {
        let fingerprint = derive_fingerprint(&SessionId::new(session), &ip);
        let value = fingerprint.as_str();
        prop_assert_eq!(value.len(), 16);
        prop_assert!(value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Derivation is pure: equal inputs, equal outputs.
    #[test]
    fn fingerprint_is_pure(session in ".{0,64}", ip in ".{0,64}") {
        let first = derive_fingerprint(&SessionId::new(session.clone()), &ip);
        let second = derive_fingerprint(&SessionId::new(session), &ip);
        prop_assert_eq!(first, second);
    }
}
