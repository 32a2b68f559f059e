// crates/snare-inspect/tests/anomaly.rs
// ============================================================================
// Module: Anomaly Scorer Tests
// Description: Tests for the isolation-forest anomaly detector.
// Purpose: Validate determinism, bounds, and degraded behavior.
// Dependencies: snare-inspect, snare-core
// ============================================================================
//! ## Overview
//! The detector is fitted from a seeded baseline, so scores are identical
//! across detector instances and processes; scores stay in `[0, 1]` and an
//! unfitted detector degrades to zero.

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
use snare_inspect::AnomalyDetector;
use snare_inspect::extract_features;

fn request(url: &str, body: &str, user_agent: &str) -> RequestEnvelope {
    RequestEnvelope {
        method: "GET".to_string(),
        url: url.to_string(),
        headers: BTreeMap::from([
            ("User-Agent".to_string(), user_agent.to_string()),
            ("Accept".to_string(), "text/html,application/json".to_string()),
        ]),
        body: body.to_string(),
        query_params: BTreeMap::new(),
        client_ip: "198.51.100.9".to_string(),
        session_id: SessionId::new("sess_ml"),
        metadata: BTreeMap::new(),
    }
}

/// Verifies an unfitted detector degrades to zero without failing.
#[test]
fn unfitted_detector_returns_zero() {
    let detector = AnomalyDetector::unfitted(0.75);
    let envelope = request("/api/users", "", "Mozilla/5.0");
    let (score, is_anomaly) = detector.predict(&extract_features(&envelope));
    assert_eq!(score, 0.0);
    assert!(!is_anomaly);
    assert!(!detector.is_fitted());
}

/// Verifies scores are identical across detector instances.
#[test]
fn fitted_detector_is_deterministic_across_instances() {
    let first = AnomalyDetector::fitted_baseline(0.75);
    let second = AnomalyDetector::fitted_baseline(0.75);
    let features = extract_features(&request(
        "/api/users?id=1' OR '1'='1",
        "",
        "sqlmap/1.0",
    ));
    assert_eq!(first.predict(&features), second.predict(&features));
}

/// Verifies scores stay inside the unit interval.
#[test]
fn scores_are_bounded() {
    let detector = AnomalyDetector::fitted_baseline(0.75);
    for (url, body, ua) in [
        ("/api/users", "", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"),
        ("/api/users?id=1' OR '1'='1", "", "sqlmap/1.0"),
        ("/x", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "nc"),
    ] {
        let (score, _) = detector.predict(&extract_features(&request(url, body, ua)));
        assert!((0.0 ..= 1.0).contains(&score));
    }
}

/// Verifies traffic from the baseline shape scores below hostile traffic.
#[test]
fn baseline_traffic_scores_below_hostile_traffic() {
    let detector = AnomalyDetector::fitted_baseline(0.75);
    let benign = extract_features(&request(
        "/api/v1/users?page=2",
        "",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    ));
    let hostile = extract_features(&request(
        "/api/v1/users?id=1' UNION SELECT username,password FROM users--",
        "'; DROP TABLE users;--",
        "sqlmap/1.0",
    ));
    let (benign_score, _) = detector.predict(&benign);
    let (hostile_score, _) = detector.predict(&hostile);
    assert!(benign_score < hostile_score);
}

/// Verifies the configured threshold drives the anomaly flag.
#[test]
fn threshold_drives_anomaly_flag() {
    let permissive = AnomalyDetector::fitted_baseline(1.0);
    let strict = AnomalyDetector::fitted_baseline(0.0);
    let features = extract_features(&request("/api/v1/users", "", "Mozilla/5.0"));
    let (_, flagged_permissive) = permissive.predict(&features);
    let (_, flagged_strict) = strict.predict(&features);
    assert!(!flagged_permissive);
    assert!(flagged_strict);
}
