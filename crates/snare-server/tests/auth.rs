// crates/snare-server/tests/auth.rs
// ============================================================================
// Module: Service Auth Tests
// Description: Tests for bearer/API-key authentication.
// Purpose: Validate fail-closed credential checking.
// Dependencies: snare-server, axum
// ============================================================================
//! ## Overview
//! With tokens configured, a missing credential is unauthenticated and a
//! wrong credential is forbidden; both bearer and API-key forms are
//! accepted. With no tokens configured the policy is local-permissive.

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

use axum::http::HeaderMap;
use axum::http::HeaderValue;
use snare_server::AuthPolicy;

fn headers(name: &str, value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
        HeaderValue::from_str(value).unwrap(),
    );
    map
}

/// Verifies a matching bearer token is accepted.
#[test]
fn matching_bearer_token_is_accepted() {
    let policy = AuthPolicy::new(vec!["secret-token".to_string()]);
    let result = policy.authorize(&headers("authorization", "Bearer secret-token"));
    assert!(result.is_ok());
}

/// Verifies a matching API key is accepted.
#[test]
fn matching_api_key_is_accepted() {
    let policy = AuthPolicy::new(vec!["service-key".to_string()]);
    assert!(policy.authorize(&headers("x-api-key", "service-key")).is_ok());
}

/// Verifies a missing credential is rejected as unauthenticated.
#[test]
fn missing_credential_is_unauthenticated() {
    let policy = AuthPolicy::new(vec!["secret-token".to_string()]);
    assert!(policy.authorize(&HeaderMap::new()).is_err());
}

/// Verifies a wrong credential is rejected.
#[test]
fn wrong_credential_is_rejected() {
    let policy = AuthPolicy::new(vec!["secret-token".to_string()]);
    assert!(policy.authorize(&headers("authorization", "Bearer wrong")).is_err());
    assert!(policy.authorize(&headers("authorization", "Basic secret-token")).is_err());
    assert!(policy.authorize(&headers("x-api-key", "wrong")).is_err());
}

/// Verifies any of several configured tokens matches.
#[test]
fn any_configured_token_matches() {
    let policy = AuthPolicy::new(vec!["one".to_string(), "two".to_string()]);
    assert!(policy.authorize(&headers("authorization", "Bearer two")).is_ok());
}

/// Verifies the local-permissive mode with no configured tokens.
#[test]
fn empty_token_set_is_permissive() {
    let policy = AuthPolicy::new(Vec::new());
    assert!(policy.authorize(&HeaderMap::new()).is_ok());
}
