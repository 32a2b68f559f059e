// crates/snare-analysis/tests/policy.rs
// ============================================================================
// Module: Policy Orchestrator Tests
// Description: Tests for the confidence ladder and push downgrade.
// Purpose: Validate auto-apply, review, logged-only, and unreachable push.
// Dependencies: snare-analysis, snare-bus, snare-core
// ============================================================================
//! ## Overview
//! Confidence at or above 0.90 auto-applies, between 0.70 and 0.90 queues
//! for review, below 0.70 is logged only. An unreachable inspector
//! downgrades an auto-applied rule to pending review without retrying.

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

use snare_analysis::GeneratedRuleStore;
use snare_analysis::PolicyOrchestrator;
use snare_bus::InMemoryTopicBus;
use snare_core::MatchKind;
use snare_core::MatchLocation;
use snare_core::PolicyOutcome;
use snare_core::Rule;
use snare_core::RuleAction;
use snare_core::RuleAudit;
use snare_core::RuleEvidence;
use snare_core::RuleId;
use snare_core::RuleMatch;

/// Inspector URL that refuses connections immediately.
const UNREACHABLE_INSPECTOR: &str = "http://127.0.0.1:9";

fn rule(confidence: f64) -> Rule {
    Rule {
        rule_id: RuleId::generate(),
        priority: 120,
        matcher: RuleMatch {
            kind: MatchKind::Regex,
            pattern: r"UNION\s+SELECT".to_string(),
            locations: vec![MatchLocation::Args],
            caseless: true,
        },
        action: RuleAction::Tag,
        confidence,
        severity: 8.0,
        enabled: true,
        evidence: RuleEvidence::default(),
        audit: RuleAudit::default(),
        expires_at: None,
    }
}

fn orchestrator(bus: Arc<InMemoryTopicBus>) -> PolicyOrchestrator {
    PolicyOrchestrator::new(
        UNREACHABLE_INSPECTOR,
        None,
        Duration::from_millis(500),
        0.90,
        0.70,
        GeneratedRuleStore::new(),
        bus,
    )
}

/// Verifies the three confidence bands and the forced override.
#[test]
fn confidence_ladder_grades_correctly() {
    let policy = orchestrator(Arc::new(InMemoryTopicBus::new()));
    assert_eq!(policy.orchestrate(&rule(0.95), false).outcome, PolicyOutcome::AutoApplied);
    assert_eq!(policy.orchestrate(&rule(0.90), false).outcome, PolicyOutcome::AutoApplied);
    assert_eq!(policy.orchestrate(&rule(0.80), false).outcome, PolicyOutcome::PendingReview);
    assert_eq!(policy.orchestrate(&rule(0.70), false).outcome, PolicyOutcome::PendingReview);
    assert_eq!(policy.orchestrate(&rule(0.50), false).outcome, PolicyOutcome::LoggedOnly);
    assert_eq!(policy.orchestrate(&rule(0.10), true).outcome, PolicyOutcome::AutoApplied);
}

/// Verifies an unreachable inspector downgrades to pending review.
#[tokio::test]
async fn unreachable_inspector_downgrades_to_review() {
    let bus = Arc::new(InMemoryTopicBus::new());
    let policy = orchestrator(Arc::clone(&bus));
    let rule = rule(0.95);
    let decision = policy.apply(&rule, false).await;
    assert_eq!(decision.outcome, PolicyOutcome::PendingReview);
    // The rule and its disposition are recorded, and an event is emitted.
    let stored = policy.rules().list();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1, Some(PolicyOutcome::PendingReview));
    assert_eq!(bus.retained_len("alerts").await, 1);
}

/// Verifies low-confidence rules are stored without any push attempt.
#[tokio::test]
async fn logged_only_rules_are_stored() {
    let bus = Arc::new(InMemoryTopicBus::new());
    let policy = orchestrator(Arc::clone(&bus));
    let decision = policy.apply(&rule(0.30), false).await;
    assert_eq!(decision.outcome, PolicyOutcome::LoggedOnly);
    assert_eq!(policy.rules().len(), 1);
}
