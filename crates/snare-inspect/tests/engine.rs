// crates/snare-inspect/tests/engine.rs
// ============================================================================
// Module: Inspection Engine Tests
// Description: Tests for the five-stage decision function.
// Purpose: Validate the decision ladder and POI event emission.
// Dependencies: snare-inspect, snare-bus, snare-core
// ============================================================================
//! ## Overview
//! A benign request is allowed with the `normal` tag; a blocking rule match
//! blocks with the full combined score; a high anomaly score tags the
//! session as POI and emits exactly one event on the telemetry topic.

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
use std::sync::Arc;

use snare_bus::InMemoryTopicBus;
use snare_core::DecisionAction;
use snare_core::MatchKind;
use snare_core::MatchLocation;
use snare_core::RequestEnvelope;
use snare_core::Rule;
use snare_core::RuleAction;
use snare_core::RuleAudit;
use snare_core::RuleEvidence;
use snare_core::RuleId;
use snare_core::RuleMatch;
use snare_core::RuleStore;
use snare_core::SessionId;
use snare_inspect::ActiveRuleSet;
use snare_inspect::AnomalyScorer;
use snare_inspect::FeatureSet;
use snare_inspect::InspectionEngine;
use snare_inspect::InspectionThresholds;
use snare_inspect::SessionWindows;

/// Scorer returning a fixed score for deterministic decisions.
struct FixedScorer {
    score: f64,
    anomalous: bool,
}

impl AnomalyScorer for FixedScorer {
    fn predict(&self, _features: &FeatureSet) -> (f64, bool) {
        (self.score, self.anomalous)
    }
}

fn engine_with(
    scorer: FixedScorer,
    rules: ActiveRuleSet,
    bus: Arc<InMemoryTopicBus>,
) -> InspectionEngine {
    InspectionEngine::new(
        rules,
        Arc::new(scorer),
        SessionWindows::new(20),
        bus,
        InspectionThresholds::default(),
    )
}

fn benign_request(session: &str) -> RequestEnvelope {
    RequestEnvelope {
        method: "GET".to_string(),
        url: "/api/users".to_string(),
        headers: BTreeMap::from([("User-Agent".to_string(), "Mozilla/5.0".to_string())]),
        body: String::new(),
        query_params: BTreeMap::new(),
        client_ip: "198.51.100.7".to_string(),
        session_id: SessionId::new(session),
        metadata: BTreeMap::new(),
    }
}

fn sqli_request(session: &str) -> RequestEnvelope {
    RequestEnvelope {
        method: "GET".to_string(),
        url: "/api/users?id=1' OR '1'='1".to_string(),
        headers: BTreeMap::from([("User-Agent".to_string(), "sqlmap/1.0".to_string())]),
        body: String::new(),
        query_params: BTreeMap::from([("id".to_string(), "1' OR '1'='1".to_string())]),
        client_ip: "203.0.113.50".to_string(),
        session_id: SessionId::new(session),
        metadata: BTreeMap::new(),
    }
}

fn block_rule(id: &str, pattern: &str) -> Rule {
    Rule {
        rule_id: RuleId::new(id),
        priority: 90,
        matcher: RuleMatch {
            kind: MatchKind::Regex,
            pattern: pattern.to_string(),
            locations: vec![MatchLocation::Args, MatchLocation::Body],
            caseless: true,
        },
        action: RuleAction::Block,
        confidence: 0.95,
        severity: 9.0,
        enabled: true,
        evidence: RuleEvidence::default(),
        audit: RuleAudit::default(),
        expires_at: None,
    }
}

/// Verifies a benign request is allowed with the normal tag and no event.
#[tokio::test]
async fn benign_request_is_allowed() {
    let bus = Arc::new(InMemoryTopicBus::new());
    let engine = engine_with(
        FixedScorer {
            score: 0.2,
            anomalous: false,
        },
        ActiveRuleSet::new(),
        Arc::clone(&bus),
    );
    let decision = engine.inspect(&benign_request("sess_benign")).await;
    assert_eq!(decision.action, DecisionAction::Allow);
    assert_eq!(decision.tags, vec!["normal".to_string()]);
    assert!(decision.scores.combined < 75.0);
    assert!(decision.event_id.is_none());
    assert_eq!(bus.retained_len("telemetry").await, 0);
}

/// Verifies a blocking rule match blocks with the full combined score.
#[tokio::test]
async fn sqli_is_blocked_by_signature_rule() {
    let rules = ActiveRuleSet::new();
    rules.create(block_rule("sqli-or", r"'\s*(OR|AND)\s*'[^']*'\s*=\s*'[^']*")).unwrap();
    let bus = Arc::new(InMemoryTopicBus::new());
    let engine = engine_with(
        FixedScorer {
            score: 0.0,
            anomalous: false,
        },
        rules,
        Arc::clone(&bus),
    );
    let decision = engine.inspect(&sqli_request("sess_block")).await;
    assert_eq!(decision.action, DecisionAction::Block);
    assert_eq!(decision.scores.rule, 100.0);
    assert_eq!(decision.scores.combined, 100.0);
    assert!(decision.scores.combined > 50.0);
    assert!(decision.tags.contains(&"signature_match".to_string()));
    assert!(decision.tags.contains(&"high_threat".to_string()));
}

/// Verifies a high anomaly score tags the session and emits one event.
#[tokio::test]
async fn anomalous_request_is_tagged_poi() {
    let bus = Arc::new(InMemoryTopicBus::new());
    let engine = engine_with(
        FixedScorer {
            score: 0.9,
            anomalous: true,
        },
        ActiveRuleSet::new(),
        Arc::clone(&bus),
    );
    let decision = engine.inspect(&sqli_request("sess_poi")).await;
    assert_eq!(decision.action, DecisionAction::TagPoi);
    assert!(decision.tags.contains(&"poi".to_string()));
    assert!(decision.event_id.is_some());
    assert_eq!(bus.retained_len("telemetry").await, 1);
}

/// Verifies a disabled blocking rule does not block.
#[tokio::test]
async fn disabled_rule_is_ignored() {
    let rules = ActiveRuleSet::new();
    rules.create(block_rule("off", r"'\s*(OR|AND)\s*'")).unwrap();
    rules.set_enabled(&RuleId::new("off"), false).unwrap();
    let bus = Arc::new(InMemoryTopicBus::new());
    let engine = engine_with(
        FixedScorer {
            score: 0.1,
            anomalous: false,
        },
        rules,
        bus,
    );
    let decision = engine.inspect(&sqli_request("sess_off")).await;
    assert_eq!(decision.action, DecisionAction::Allow);
}

/// Verifies the session window caps at twenty entries across inspections.
#[tokio::test]
async fn window_is_capped_across_inspections() {
    let bus = Arc::new(InMemoryTopicBus::new());
    let engine = engine_with(
        FixedScorer {
            score: 0.1,
            anomalous: false,
        },
        ActiveRuleSet::new(),
        bus,
    );
    let session = SessionId::new("sess_window");
    for _ in 0 .. 25 {
        let _ = engine.inspect(&benign_request("sess_window")).await;
    }
    let entries = engine.windows().entries(&session);
    assert_eq!(entries.len(), 20);
    for pair in entries.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}
