// crates/snare-inspect/tests/features.rs
// ============================================================================
// Module: Feature Extraction Tests
// Description: Tests for the deterministic 102-feature extractor.
// Purpose: Validate count, determinism, and family behavior.
// Dependencies: snare-inspect, snare-core
// ============================================================================
//! ## Overview
//! Feature vectors from identical requests must be identical, carry exactly
//! 102 values, and expose the attack-pattern signal for hostile inputs.

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
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use snare_core::RequestEnvelope;
use snare_core::SessionId;
use snare_inspect::FEATURE_COUNT;
use snare_inspect::extract_features;

fn benign_request() -> RequestEnvelope {
    RequestEnvelope {
        method: "GET".to_string(),
        url: "/api/users".to_string(),
        headers: BTreeMap::from([("User-Agent".to_string(), "Mozilla/5.0".to_string())]),
        body: String::new(),
        query_params: BTreeMap::new(),
        client_ip: "198.51.100.7".to_string(),
        session_id: SessionId::new("sess_01"),
        metadata: BTreeMap::new(),
    }
}

fn sqli_request() -> RequestEnvelope {
    RequestEnvelope {
        method: "GET".to_string(),
        url: "/api/users?id=1' OR '1'='1".to_string(),
        headers: BTreeMap::from([("User-Agent".to_string(), "sqlmap/1.0".to_string())]),
        body: String::new(),
        query_params: BTreeMap::from([("id".to_string(), "1' OR '1'='1".to_string())]),
        client_ip: "203.0.113.50".to_string(),
        session_id: SessionId::new("sess_02"),
        metadata: BTreeMap::new(),
    }
}

/// Verifies exactly 102 features are produced.
#[test]
fn feature_count_is_exact() {
    assert_eq!(extract_features(&benign_request()).len(), FEATURE_COUNT);
    assert_eq!(extract_features(&sqli_request()).len(), FEATURE_COUNT);
}

/// Verifies identical inputs yield identical vectors.
#[test]
fn extraction_is_deterministic() {
    let first = extract_features(&benign_request());
    let second = extract_features(&benign_request());
    assert_eq!(first, second);
    assert_eq!(first.to_vector(), second.to_vector());
}

/// Verifies feature names are frozen in sorted order.
#[test]
fn feature_names_are_sorted() {
    let names = extract_features(&benign_request()).names();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert_eq!(names.len(), FEATURE_COUNT);
}

/// Verifies a missing feature reads as zero.
#[test]
fn missing_feature_defaults_to_zero() {
    let features = extract_features(&benign_request());
    assert_eq!(features.get("no_such_feature"), 0.0);
}

/// Verifies the attack-pattern family reacts to SQL injection input.
#[test]
fn sqli_lights_up_pattern_features() {
    let benign = extract_features(&benign_request());
    let hostile = extract_features(&sqli_request());
    assert_eq!(benign.get("sql_keyword_count"), 0.0);
    assert!(hostile.get("sql_keyword_count") >= 1.0);
    assert!(hostile.get("quote_count") >= 4.0);
    assert_eq!(hostile.get("user_agent_is_scanner"), 1.0);
    assert_eq!(benign.get("user_agent_is_scanner"), 0.0);
}

/// Verifies method and shape flags.
#[test]
fn basic_shape_flags_are_set() {
    let features = extract_features(&benign_request());
    assert_eq!(features.get("method_is_get"), 1.0);
    assert_eq!(features.get("method_is_post"), 0.0);
    assert_eq!(features.get("has_body"), 0.0);
    assert_eq!(features.get("has_query_params"), 0.0);
}

/// Verifies behavioral metadata flows through when supplied.
#[test]
fn behavioral_metadata_is_used() {
    let mut request = benign_request();
    request.metadata.insert("req_per_sec".to_string(), 12.5);
    request.metadata.insert("failed_auth".to_string(), 3.0);
    let features = extract_features(&request);
    assert_eq!(features.get("requests_per_second"), 12.5);
    assert_eq!(features.get("failed_auth_attempts"), 3.0);
}
