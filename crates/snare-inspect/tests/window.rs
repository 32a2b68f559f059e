// crates/snare-inspect/tests/window.rs
// ============================================================================
// Module: Session Window Tests
// Description: Tests for capped per-session score windows.
// Purpose: Validate the cap, ordering, and behavioral scoring.
// Dependencies: snare-inspect, snare-core
// ============================================================================
//! ## Overview
//! After more than twenty appends a window holds exactly twenty entries with
//! non-decreasing timestamps, and the behavioral score follows the
//! variance/mean formula once three entries exist.

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

use snare_core::SessionId;
use snare_core::Timestamp;
use snare_inspect::SessionWindows;
use snare_inspect::WindowEntry;

fn entry(ml_score: f64) -> WindowEntry {
    WindowEntry {
        timestamp: Timestamp::now(),
        ml_score,
        features: vec![0.0; 4],
    }
}

/// Verifies the window never exceeds its cap and evicts oldest first.
#[test]
fn window_caps_at_twenty_entries() {
    let windows = SessionWindows::new(20);
    let session = SessionId::new("sess_cap");
    for i in 0 .. 25 {
        windows.append(&session, entry(f64::from(i) / 25.0));
    }
    let entries = windows.entries(&session);
    assert_eq!(entries.len(), 20);
    // The five oldest scores were evicted.
    assert_eq!(entries[0].ml_score, 5.0 / 25.0);
}

/// Verifies timestamps within a window are non-decreasing.
#[test]
fn window_timestamps_are_non_decreasing() {
    let windows = SessionWindows::new(20);
    let session = SessionId::new("sess_order");
    for _ in 0 .. 24 {
        windows.append(&session, entry(0.1));
    }
    let entries = windows.entries(&session);
    for pair in entries.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

/// Verifies behavioral scoring requires three entries.
#[test]
fn behavioral_score_needs_three_entries() {
    let windows = SessionWindows::new(20);
    let session = SessionId::new("sess_min");
    assert_eq!(windows.behavioral_score(&session), 0.0);
    windows.append(&session, entry(0.9));
    windows.append(&session, entry(0.9));
    assert_eq!(windows.behavioral_score(&session), 0.0);
    windows.append(&session, entry(0.9));
    assert!(windows.behavioral_score(&session) > 0.0);
}

/// Verifies the variance/mean formula on constant scores.
#[test]
fn behavioral_score_matches_formula_for_constant_scores() {
    let windows = SessionWindows::new(20);
    let session = SessionId::new("sess_formula");
    for _ in 0 .. 5 {
        windows.append(&session, entry(0.8));
    }
    // Zero variance: score = 0.5 * mean.
    let score = windows.behavioral_score(&session);
    assert!((score - 0.4).abs() < 1e-9);
}

/// Verifies the behavioral score is clamped to one.
#[test]
fn behavioral_score_is_clamped() {
    let windows = SessionWindows::new(20);
    let session = SessionId::new("sess_clamp");
    // Alternating extremes maximize variance.
    for i in 0 .. 10 {
        windows.append(&session, entry(if i % 2 == 0 { 1.0 } else { 0.0 }));
    }
    assert!(windows.behavioral_score(&session) <= 1.0);
}

/// Verifies sessions are tracked independently.
#[test]
fn sessions_are_isolated() {
    let windows = SessionWindows::new(20);
    windows.append(&SessionId::new("a"), entry(0.5));
    windows.append(&SessionId::new("b"), entry(0.5));
    assert_eq!(windows.session_count(), 2);
    assert_eq!(windows.entries(&SessionId::new("a")).len(), 1);
}
