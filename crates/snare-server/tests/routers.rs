// crates/snare-server/tests/routers.rs
// ============================================================================
// Module: Service Router Construction Tests
// Description: Smoke tests wiring each service router from fakes.
// Purpose: Validate that service states compose from injected backends.
// Dependencies: snare-server, snare-inspect, snare-router, snare-analysis
// ============================================================================
//! ## Overview
//! Each service router must build from in-memory backends exactly as the
//! launcher wires them; these tests catch wiring drift between the server
//! states and the component constructors.

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
use snare_analysis::FakeSandboxRunner;
use snare_analysis::GeneratedRuleStore;
use snare_analysis::InMemoryProfileStore;
use snare_analysis::InMemorySimulationStore;
use snare_analysis::PayloadSimulator;
use snare_analysis::PolicyOrchestrator;
use snare_analysis::RuleGenerator;
use snare_analysis::SandboxSpec;
use snare_analysis::SimulationQueue;
use snare_bus::InMemoryTopicBus;
use snare_core::NoopAuditSink;
use snare_core::NoopMetrics;
use snare_core::ProfileStore;
use snare_core::SimulationStore;
use snare_core::TopicBus;
use snare_inspect::ActiveRuleSet;
use snare_inspect::AnomalyDetector;
use snare_inspect::InspectionEngine;
use snare_inspect::InspectionThresholds;
use snare_inspect::SessionWindows;
use snare_router::InMemoryPinStore;
use snare_router::SessionRouter;
use snare_server::AnalysisState;
use snare_server::AuthPolicy;
use snare_server::InspectorState;
use snare_server::RateLimitSettings;
use snare_server::RateLimiter;
use snare_server::RouterState;
use snare_server::analysis_router;
use snare_server::inspector_router;
use snare_server::routing_router;
use tokio::sync::Semaphore;

/// Verifies the inspector router builds from injected components.
#[tokio::test]
async fn inspector_router_builds() {
    let bus: Arc<dyn TopicBus> = Arc::new(InMemoryTopicBus::new());
    let engine = Arc::new(InspectionEngine::new(
        ActiveRuleSet::new(),
        Arc::new(AnomalyDetector::unfitted(0.75)),
        SessionWindows::new(20),
        bus,
        InspectionThresholds::default(),
    ));
    let state = Arc::new(InspectorState {
        engine,
        auth: AuthPolicy::new(Vec::new()),
        limiter: RateLimiter::new(RateLimitSettings::default()),
        audit: Arc::new(NoopAuditSink),
        metrics: Arc::new(NoopMetrics),
        inflight: Arc::new(Semaphore::new(256)),
    });
    let _router = inspector_router(state);
}

/// Verifies the router-service router builds from injected components.
#[tokio::test]
async fn routing_router_builds() {
    let state = Arc::new(RouterState {
        router: SessionRouter::new(
            Arc::new(InMemoryPinStore::new()),
            "http://production-backend:8080",
            "http://decoy:8080",
        ),
        auth: AuthPolicy::new(Vec::new()),
        bus: Arc::new(InMemoryTopicBus::new()),
        default_pin_hours: 24.0,
        audit: Arc::new(NoopAuditSink),
        inflight: Arc::new(Semaphore::new(256)),
    });
    let _router = routing_router(state);
}

/// Verifies the analysis router builds with a running job queue.
#[tokio::test]
async fn analysis_router_builds() {
    let bus: Arc<dyn TopicBus> = Arc::new(InMemoryTopicBus::new());
    let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let simulations: Arc<dyn SimulationStore> = Arc::new(InMemorySimulationStore::new());
    let policy = Arc::new(PolicyOrchestrator::new(
        "http://127.0.0.1:9",
        None,
        Duration::from_millis(500),
        0.90,
        0.70,
        GeneratedRuleStore::new(),
        bus,
    ));
    let simulator = Arc::new(PayloadSimulator::new(
        Arc::new(FakeSandboxRunner::hardened()),
        SandboxSpec::default(),
        Duration::from_secs(30),
    ));
    let queue = SimulationQueue::start(
        2,
        simulator,
        RuleGenerator::new(),
        Arc::clone(&policy),
        Arc::clone(&profiles),
        simulations,
    );
    let state = Arc::new(AnalysisState {
        profiler: BehavioralProfiler::new(),
        profiles,
        queue,
        generator: RuleGenerator::new(),
        policy,
        auth: AuthPolicy::new(Vec::new()),
        audit: Arc::new(NoopAuditSink),
        inflight: Arc::new(Semaphore::new(256)),
    });
    let _router = analysis_router(state);
}
