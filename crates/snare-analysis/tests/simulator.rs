// crates/snare-analysis/tests/simulator.rs
// ============================================================================
// Module: Payload Simulator Tests
// Description: Tests for detonation verdicts and sandbox lifecycle.
// Purpose: Validate verdict analysis, severity, and mandatory teardown.
// Dependencies: snare-analysis, snare-core
// ============================================================================
//! ## Overview
//! Detonations against the vulnerable fake confirm exploitation; against the
//! hardened fake they do not; provisioning failures become `error` verdicts
//! with severity zero. Every provisioned sandbox is torn down.

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

use std::sync::Arc;
use std::time::Duration;

use snare_analysis::FakeSandboxRunner;
use snare_analysis::PayloadSimulator;
use snare_analysis::SandboxSpec;
use snare_core::PayloadArtifact;
use snare_core::PayloadKind;
use snare_core::VerdictKind;
use snare_core::hashing::hash_bytes;

fn payload(kind: PayloadKind, value: &str, confidence: f64) -> PayloadArtifact {
    PayloadArtifact {
        artifact_id: "payload_000".to_string(),
        payload_type: kind,
        payload_value: value.to_string(),
        location: "query.id".to_string(),
        confidence,
        file_path: None,
        checksum: hash_bytes(value.as_bytes()),
    }
}

fn simulator(runner: Arc<FakeSandboxRunner>) -> PayloadSimulator {
    PayloadSimulator::new(runner, SandboxSpec::default(), Duration::from_secs(300))
}

/// Verifies a leaking SQL injection probe confirms exploitation.
#[tokio::test]
async fn vulnerable_sqli_is_exploit_possible() {
    let runner = Arc::new(FakeSandboxRunner::vulnerable());
    let verdict = simulator(Arc::clone(&runner))
        .simulate(&payload(PayloadKind::SqlInjection, "1' OR '1'='1", 0.95), "main")
        .await;
    assert_eq!(verdict.verdict, VerdictKind::ExploitPossible);
    assert_eq!(verdict.severity, 9.0 * 0.95);
    assert_eq!(verdict.attack_type, PayloadKind::SqlInjection);
    assert!(!verdict.reproduction_steps.is_empty());
    assert!(verdict.evidence.stdout.contains("admin@shadow.local"));
    assert_eq!(runner.provisioned_count(), 1);
    assert_eq!(runner.teardown_count(), 1);
}

/// Verifies the hardened shadow app yields no exploitation.
#[tokio::test]
async fn hardened_app_is_exploit_improbable() {
    let runner = Arc::new(FakeSandboxRunner::hardened());
    for (kind, value) in [
        (PayloadKind::SqlInjection, "1' OR '1'='1"),
        (PayloadKind::Xss, "<script>alert(1)</script>"),
        (PayloadKind::CommandInjection, "; cat /etc/passwd"),
        (PayloadKind::PathTraversal, "../../../etc/passwd"),
    ] {
        let verdict =
            simulator(Arc::clone(&runner)).simulate(&payload(kind, value, 0.9), "main").await;
        assert_eq!(verdict.verdict, VerdictKind::ExploitImprobable, "kind {kind:?}");
        assert_eq!(verdict.severity, 0.0);
    }
    assert_eq!(runner.provisioned_count(), runner.teardown_count());
}

/// Verifies command injection severity tops the table.
#[tokio::test]
async fn command_injection_severity_is_highest() {
    let runner = Arc::new(FakeSandboxRunner::vulnerable());
    let verdict = simulator(runner)
        .simulate(&payload(PayloadKind::CommandInjection, "; id", 1.0), "main")
        .await;
    assert_eq!(verdict.verdict, VerdictKind::ExploitPossible);
    assert_eq!(verdict.severity, 10.0);
}

/// Verifies a reflected XSS probe confirms exploitation.
#[tokio::test]
async fn reflected_xss_is_exploit_possible() {
    let runner = Arc::new(FakeSandboxRunner::vulnerable());
    let verdict = simulator(runner)
        .simulate(&payload(PayloadKind::Xss, "<script>alert(1)</script>", 0.8), "main")
        .await;
    assert_eq!(verdict.verdict, VerdictKind::ExploitPossible);
    assert_eq!(verdict.severity, 7.0 * 0.8);
}

/// Verifies provisioning failures become error verdicts, severity zero.
#[tokio::test]
async fn provisioning_failure_is_error_verdict() {
    let runner = Arc::new(FakeSandboxRunner::broken());
    let verdict = simulator(runner)
        .simulate(&payload(PayloadKind::SqlInjection, "1' OR '1'='1", 0.95), "main")
        .await;
    assert_eq!(verdict.verdict, VerdictKind::Error);
    assert_eq!(verdict.severity, 0.0);
    assert!(verdict.error.is_some());
}
