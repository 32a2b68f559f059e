// crates/snare-analysis/tests/pipeline.rs
// ============================================================================
// Module: Analysis Pipeline Tests
// Description: End-to-end evidence pointer processing against fakes.
// Purpose: Validate retrieve, profile, detonate, synthesize, orchestrate.
// Dependencies: snare-analysis, snare-evidence, snare-store, snare-bus
// ============================================================================
//! ## Overview
//! A captured session is packaged by the evidence builder, retrieved by the
//! consumer, profiled, detonated against the vulnerable fake sandbox, and
//! turned into a rule whose disposition is recorded. Processing the same
//! pointer twice is a no-op.

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

use std::sync::Arc;
use std::time::Duration;

use snare_analysis::BehavioralProfiler;
use snare_analysis::EvidenceConsumer;
use snare_analysis::FakeSandboxRunner;
use snare_analysis::GeneratedRuleStore;
use snare_analysis::InMemoryProfileStore;
use snare_analysis::PayloadSimulator;
use snare_analysis::PolicyOrchestrator;
use snare_analysis::RuleGenerator;
use snare_analysis::SandboxSpec;
use snare_bus::InMemoryTopicBus;
use snare_core::EventId;
use snare_core::PayloadKind;
use snare_core::PolicyOutcome;
use snare_core::ProfileStore;
use snare_core::SessionId;
use snare_core::Timestamp;
use snare_core::TopicBus;
use snare_evidence::EvidenceBuilder;
use snare_evidence::EvidenceRetriever;
use snare_evidence::HarExchange;
use snare_store::InMemoryBlobStore;

/// Builds and uploads a captured SQL injection session.
async fn upload_session(
    store: &InMemoryBlobStore,
    bus: &InMemoryTopicBus,
) -> snare_core::EvidencePointer {
    let mut builder = EvidenceBuilder::new(
        EventId::new("evt_pipeline"),
        SessionId::new("sess_pipeline"),
        "203.0.113.42",
        "sqlmap/1.0",
    )
    .unwrap();
    for (url, status) in
        [("/api/v1/users?id=1' OR '1'='1", 200), ("/api/v1/users?id=2' OR '1'='1", 200)]
    {
        builder.add_har_entry(HarExchange {
            method: "GET".to_string(),
            url: url.to_string(),
            request_headers: vec![("User-Agent".to_string(), "sqlmap/1.0".to_string())],
            request_body: String::new(),
            response_status: status,
            response_headers: vec![(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )],
            response_body: "{\"users\":[]}".to_string(),
            started_at: Timestamp::now(),
            duration_ms: 18.0,
        });
    }
    builder
        .add_payload(PayloadKind::SqlInjection, "1' OR '1'='1", "query.id", 0.95, true)
        .unwrap();
    builder.add_tag("sql_injection");
    builder.build_and_upload(store, bus, "decoy-evidence", None).await.unwrap()
}

fn consumer(
    store: InMemoryBlobStore,
    bus: Arc<InMemoryTopicBus>,
    runner: Arc<FakeSandboxRunner>,
    profiles: Arc<dyn ProfileStore>,
    policy: Arc<PolicyOrchestrator>,
    workspace: &std::path::Path,
) -> EvidenceConsumer<InMemoryBlobStore> {
    let retriever = EvidenceRetriever::new(store, workspace).unwrap();
    let simulator = Arc::new(PayloadSimulator::new(
        runner,
        SandboxSpec::default(),
        Duration::from_secs(30),
    ));
    EvidenceConsumer::new(
        bus,
        retriever,
        BehavioralProfiler::new(),
        profiles,
        simulator,
        RuleGenerator::new(),
        policy,
    )
}

/// Verifies the full pipeline over one pointer.
#[tokio::test]
async fn pointer_flows_through_the_pipeline() {
    let store = InMemoryBlobStore::new();
    let bus = Arc::new(InMemoryTopicBus::new());
    let pointer = upload_session(&store, &bus).await;

    let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let policy = Arc::new(PolicyOrchestrator::new(
        "http://127.0.0.1:9",
        None,
        Duration::from_millis(500),
        0.90,
        0.70,
        GeneratedRuleStore::new(),
        Arc::clone(&bus) as Arc<dyn TopicBus>,
    ));
    let runner = Arc::new(FakeSandboxRunner::vulnerable());
    let workspace = tempfile::tempdir().unwrap();
    let consumer = consumer(
        store,
        Arc::clone(&bus),
        Arc::clone(&runner),
        Arc::clone(&profiles),
        Arc::clone(&policy),
        workspace.path(),
    );

    consumer.handle_pointer(&pointer).await;

    // The session was profiled from its HAR log.
    let profile = profiles.get(&SessionId::new("sess_pipeline")).unwrap().unwrap();
    assert_eq!(profile.action_sequence.len(), 2);
    assert!(profile.sophistication > 0.0);

    // The payload detonated and produced a rule with a disposition.
    assert_eq!(runner.provisioned_count(), 1);
    assert_eq!(runner.teardown_count(), 1);
    let rules = policy.rules().list();
    assert_eq!(rules.len(), 1);
    assert!(rules[0].1.is_some());
    // The unreachable inspector keeps confirmed rules in review.
    assert_ne!(rules[0].1, Some(PolicyOutcome::AutoApplied));

    // Reprocessing the same pointer is a no-op.
    consumer.handle_pointer(&pointer).await;
    assert_eq!(runner.provisioned_count(), 1);
    assert_eq!(policy.rules().len(), 1);
}

/// Verifies one bad pointer does not poison later processing.
#[tokio::test]
async fn bad_pointer_is_skipped() {
    let store = InMemoryBlobStore::new();
    let bus = Arc::new(InMemoryTopicBus::new());
    let good_pointer = upload_session(&store, &bus).await;

    let mut bad_pointer = good_pointer.clone();
    bad_pointer.event_id = EventId::new("evt_missing");
    bad_pointer.location = "not a url".to_string();

    let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let policy = Arc::new(PolicyOrchestrator::new(
        "http://127.0.0.1:9",
        None,
        Duration::from_millis(500),
        0.90,
        0.70,
        GeneratedRuleStore::new(),
        Arc::clone(&bus) as Arc<dyn TopicBus>,
    ));
    let runner = Arc::new(FakeSandboxRunner::vulnerable());
    let workspace = tempfile::tempdir().unwrap();
    let consumer = consumer(
        store,
        Arc::clone(&bus),
        runner,
        Arc::clone(&profiles),
        policy,
        workspace.path(),
    );

    consumer.handle_pointer(&bad_pointer).await;
    assert!(profiles.get(&SessionId::new("sess_pipeline")).unwrap().is_none());

    consumer.handle_pointer(&good_pointer).await;
    assert!(profiles.get(&SessionId::new("sess_pipeline")).unwrap().is_some());
}
