// crates/snare-analysis/tests/profiler.rs
// ============================================================================
// Module: Behavioral Profiler Tests
// Description: Tests for action classification, intent, and sophistication.
// Purpose: Validate deterministic profiling of captured sessions.
// Dependencies: snare-analysis, snare-core
// ============================================================================
//! ## Overview
//! Profiling the same captures twice must yield the same profile; action
//! buckets, TTP mappings, and the intent ladder follow the classification
//! rules exactly.

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

use snare_analysis::BehavioralProfiler;
use snare_analysis::CaptureRecord;
use snare_analysis::profiler::classify_action;
use snare_core::AttackIntent;
use snare_core::PayloadKind;
use snare_core::SessionId;
use snare_core::Timestamp;

fn capture(method: &str, url: &str) -> CaptureRecord {
    CaptureRecord {
        method: method.to_string(),
        url: url.to_string(),
        timestamp: Some(Timestamp::now()),
        status: Some(200),
        payload_types: Vec::new(),
        user_agent: Some("Mozilla/5.0".to_string()),
        body: None,
    }
}

fn capture_with_payload(method: &str, url: &str, kind: PayloadKind) -> CaptureRecord {
    CaptureRecord {
        payload_types: vec![kind],
        ..capture(method, url)
    }
}

/// Verifies the action classification buckets.
#[test]
fn actions_classify_by_payload_then_path_then_method() {
    assert_eq!(
        classify_action(&capture_with_payload("GET", "/x", PayloadKind::SqlInjection)),
        "sql_injection_attempt"
    );
    assert_eq!(classify_action(&capture("GET", "/api/v1/users")), "user_enumeration");
    assert_eq!(classify_action(&capture("GET", "/admin/panel")), "admin_access_attempt");
    assert_eq!(classify_action(&capture("GET", "/.env")), "config_disclosure_attempt");
    assert_eq!(classify_action(&capture("POST", "/login")), "authentication_attempt");
    assert_eq!(classify_action(&capture("POST", "/upload")), "file_upload_attempt");
    assert_eq!(
        classify_action(&capture("GET", "/documents/42/download")),
        "data_access_attempt"
    );
    assert_eq!(classify_action(&capture("GET", "/landing")), "reconnaissance");
    assert_eq!(classify_action(&capture("POST", "/landing")), "exploitation_attempt");
    assert_eq!(classify_action(&capture("PUT", "/landing")), "modification_attempt");
    assert_eq!(classify_action(&capture("DELETE", "/landing")), "deletion_attempt");
}

/// Verifies profiling is deterministic for identical captures.
#[test]
fn profiling_is_deterministic() {
    let profiler = BehavioralProfiler::new();
    let session = SessionId::new("sess_det");
    let captures = vec![
        capture_with_payload("GET", "/api/v1/users?id=1'", PayloadKind::SqlInjection),
        capture("GET", "/admin"),
        capture("GET", "/docs"),
    ];
    let first = profiler.analyze_session(&session, &captures);
    let second = profiler.analyze_session(&session, &captures);
    assert_eq!(first, second);
}

/// Verifies the TTP mapping is deduplicated and sorted.
#[test]
fn ttps_are_deduplicated_and_sorted() {
    let profiler = BehavioralProfiler::new();
    let captures = vec![
        capture_with_payload("GET", "/a", PayloadKind::SqlInjection),
        capture_with_payload("GET", "/b", PayloadKind::Xss),
        capture_with_payload("GET", "/c", PayloadKind::SqlInjection),
        capture("POST", "/login"),
        capture("POST", "/upload"),
    ];
    let profile = profiler.analyze_session(&SessionId::new("sess_ttp"), &captures);
    assert_eq!(profile.ttps, vec!["T1059.007", "T1105", "T1110", "T1190"]);
}

/// Verifies the exploitation intent path.
#[test]
fn exploit_heavy_sessions_read_as_exploitation() {
    let profiler = BehavioralProfiler::new();
    let captures = vec![
        capture_with_payload("GET", "/a", PayloadKind::SqlInjection),
        capture_with_payload("GET", "/b", PayloadKind::Xss),
        capture_with_payload("GET", "/c", PayloadKind::CommandInjection),
        capture("GET", "/landing"),
    ];
    let profile = profiler.analyze_session(&SessionId::new("sess_exploit"), &captures);
    assert_eq!(profile.intent, AttackIntent::Exploitation);
}

/// Verifies the reconnaissance intent path.
#[test]
fn recon_heavy_sessions_read_as_reconnaissance() {
    let profiler = BehavioralProfiler::new();
    let captures =
        vec![capture("GET", "/a"), capture("GET", "/b"), capture("GET", "/c"), capture("GET", "/d")];
    let profile = profiler.analyze_session(&SessionId::new("sess_recon"), &captures);
    assert_eq!(profile.intent, AttackIntent::Reconnaissance);
}

/// Verifies any admin access reads as privilege escalation when nothing
/// else dominates.
#[test]
fn admin_access_reads_as_privilege_escalation() {
    let profiler = BehavioralProfiler::new();
    let captures = vec![
        capture("GET", "/admin"),
        capture("POST", "/update"),
        capture("PUT", "/update"),
        capture("DELETE", "/update"),
    ];
    let profile = profiler.analyze_session(&SessionId::new("sess_priv"), &captures);
    assert_eq!(profile.intent, AttackIntent::PrivilegeEscalation);
}

/// Verifies the sophistication components for a known session.
#[test]
fn sophistication_matches_component_sum() {
    let profiler = BehavioralProfiler::new();
    // One distinct attack category (0.5), no obfuscation (0), scanner UA
    // (1.0), fewer than ten requests (3.0): total 4.5.
    let mut sqli = capture_with_payload("GET", "/a", PayloadKind::SqlInjection);
    sqli.user_agent = Some("sqlmap/1.0".to_string());
    let profile = profiler.analyze_session(&SessionId::new("sess_soph"), &[sqli]);
    assert_eq!(profile.sophistication, 4.5);
}

/// Verifies empty sessions produce the empty profile.
#[test]
fn empty_sessions_produce_empty_profile() {
    let profiler = BehavioralProfiler::new();
    let profile = profiler.analyze_session(&SessionId::new("sess_empty"), &[]);
    assert_eq!(profile.intent, AttackIntent::Unknown);
    assert!(profile.action_sequence.is_empty());
    assert_eq!(profile.sophistication, 0.0);
}

/// Verifies clustering labels similar sessions together and marks noise.
#[test]
fn clustering_groups_similar_profiles() {
    let profiler = BehavioralProfiler::new();
    let small = vec![capture("GET", "/a"), capture("GET", "/b")];
    let mut profiles = vec![
        profiler.analyze_session(&SessionId::new("s1"), &small),
        profiler.analyze_session(&SessionId::new("s2"), &small),
        profiler.analyze_session(&SessionId::new("s3"), &small),
    ];
    profiler.cluster_sessions(&mut profiles);
    // Identical shapes land in the same cluster.
    let labels: Vec<i32> = profiles.iter().filter_map(|p| p.cluster_id).collect();
    assert_eq!(labels.len(), 3);
    assert!(labels.iter().all(|label| *label == labels[0]));
    assert!(labels[0] >= 0);
}
