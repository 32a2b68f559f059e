// crates/snare-analysis/src/consumer.rs
// ============================================================================
// Module: Snare Evidence Consumer
// Description: Subscribes to evidence pointers and drives the pipeline.
// Purpose: Retrieve, profile, detonate, synthesize, and orchestrate.
// Dependencies: snare-core, snare-evidence, crate::{profiler, simulator}
// ============================================================================

//! ## Overview
//! The consumer subscribes to the `evidence-ready` topic with a latest
//! offset reset and processes each pointer synchronously: download and
//! validate the package, profile the session from its HAR log, detonate
//! every payload artifact in sequence, synthesize rules from confirmed
//! exploits, and route them through the policy orchestrator. Processing is
//! idempotent keyed by event id, and one bad pointer is logged and skipped
//! rather than stopping the loop. A shutdown signal stops the loop after
//! the in-flight message completes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use snare_core::BlobStore;
use snare_core::EventId;
use snare_core::EvidencePointer;
use snare_core::OffsetReset;
use snare_core::ProfileStore;
use snare_core::Timestamp;
use snare_core::TopicBus;
use snare_evidence::EvidenceRetriever;
use snare_evidence::HarEntry;
use snare_evidence::RetrievedEvidence;

use crate::policy::PolicyOrchestrator;
use crate::profiler::BehavioralProfiler;
use crate::profiler::CaptureRecord;
use crate::rulegen::RuleGenerator;
use crate::simulator::PayloadSimulator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Topic carrying evidence pointers.
const EVIDENCE_TOPIC: &str = "evidence-ready";
/// Consumer group name.
const CONSUMER_GROUP: &str = "analysis-evidence";

// ============================================================================
// SECTION: Evidence Consumer
// ============================================================================

/// Evidence pointer consumer driving the analysis pipeline.
pub struct EvidenceConsumer<S> {
    /// Bus the consumer subscribes on.
    bus: Arc<dyn TopicBus>,
    /// Package retriever.
    retriever: EvidenceRetriever<S>,
    /// Behavioral profiler.
    profiler: BehavioralProfiler,
    /// Profile store.
    profiles: Arc<dyn ProfileStore>,
    /// Payload simulator.
    simulator: Arc<PayloadSimulator>,
    /// Rule generator.
    generator: RuleGenerator,
    /// Policy orchestrator.
    policy: Arc<PolicyOrchestrator>,
    /// Event ids already processed (idempotency set).
    seen: Mutex<BTreeSet<EventId>>,
}

impl<S: BlobStore> EvidenceConsumer<S> {
    /// Builds a consumer from its collaborators.
    #[must_use]
    pub fn new(
        bus: Arc<dyn TopicBus>,
        retriever: EvidenceRetriever<S>,
        profiler: BehavioralProfiler,
        profiles: Arc<dyn ProfileStore>,
        simulator: Arc<PayloadSimulator>,
        generator: RuleGenerator,
        policy: Arc<PolicyOrchestrator>,
    ) -> Self {
        Self {
            bus,
            retriever,
            profiler,
            profiles,
            simulator,
            generator,
            policy,
            seen: Mutex::new(BTreeSet::new()),
        }
    }

    /// Runs the subscriber loop until the shutdown signal flips.
    ///
    /// # Errors
    ///
    /// Returns the subscription error when the topic cannot be joined; the
    /// processing loop itself logs and continues past bad pointers.
    pub async fn run(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<(), snare_core::BusError> {
        let mut subscription =
            self.bus.subscribe(EVIDENCE_TOPIC, CONSUMER_GROUP, OffsetReset::Latest).await?;
        loop {
            tokio::select! {
                message = subscription.recv() => {
                    let Some(message) = message else { break };
                    match serde_json::from_slice::<EvidencePointer>(&message.payload) {
                        Ok(pointer) => self.handle_pointer(&pointer).await,
                        Err(err) => {
                            tracing::warn!(error = %err, "unparseable evidence pointer skipped");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("evidence consumer stopped");
        Ok(())
    }

    /// Processes one pointer end to end; errors are logged, never raised.
    pub async fn handle_pointer(&self, pointer: &EvidencePointer) {
        if !self.mark_seen(&pointer.event_id) {
            tracing::debug!(event_id = %pointer.event_id, "duplicate pointer skipped");
            return;
        }
        let evidence = match self.retriever.retrieve(pointer).await {
            Ok(evidence) => evidence,
            Err(err) => {
                tracing::warn!(event_id = %pointer.event_id, error = %err, "evidence retrieval failed");
                self.unmark_seen(&pointer.event_id);
                return;
            }
        };
        if !evidence.valid {
            tracing::warn!(event_id = %pointer.event_id, "processing evidence with checksum mismatch");
        }

        let captures = captures_from_evidence(&evidence);
        let profile = self.profiler.analyze_session(&pointer.session_id, &captures);
        tracing::info!(
            event_id = %pointer.event_id,
            session_id = %pointer.session_id,
            intent = profile.intent.as_str(),
            sophistication = profile.sophistication,
            "session profiled"
        );
        if let Err(err) = self.profiles.put(profile.clone()) {
            tracing::warn!(error = %err, "profile store write failed");
        }

        // Detonations within one pointer run strictly in sequence; the
        // sandbox runner bounds parallelism across pointers.
        for payload in &evidence.payloads {
            let verdict = self.simulator.simulate(payload, "main").await;
            tracing::info!(
                event_id = %pointer.event_id,
                artifact = %payload.artifact_id,
                verdict = verdict.verdict.as_str(),
                severity = verdict.severity,
                "payload detonated"
            );
            let Some(rule) =
                self.generator.generate_rule(payload, &verdict, Some(&profile), None)
            else {
                continue;
            };
            let decision = self.policy.apply(&rule, false).await;
            tracing::info!(
                rule_id = %rule.rule_id,
                outcome = decision.outcome.as_str(),
                "rule disposition recorded"
            );
        }

        self.retriever.cleanup(&evidence.workspace);
    }

    /// Marks an event id as processed; false when already seen.
    fn mark_seen(&self, event_id: &EventId) -> bool {
        self.seen.lock().map(|mut guard| guard.insert(event_id.clone())).unwrap_or(false)
    }

    /// Releases an event id after a failed retrieval so retries proceed.
    fn unmark_seen(&self, event_id: &EventId) {
        if let Ok(mut guard) = self.seen.lock() {
            guard.remove(event_id);
        }
    }
}

// ============================================================================
// SECTION: Capture Conversion
// ============================================================================

/// Builds profiler captures from retrieved evidence.
fn captures_from_evidence(evidence: &RetrievedEvidence) -> Vec<CaptureRecord> {
    evidence
        .har_log
        .as_ref()
        .map(|har| har.entries.iter().map(capture_from_entry).collect())
        .unwrap_or_default()
}

/// Converts one HAR entry into a profiler capture.
fn capture_from_entry(entry: &HarEntry) -> CaptureRecord {
    let user_agent = entry
        .request
        .headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case("User-Agent"))
        .map(|header| header.value.clone());
    CaptureRecord {
        method: entry.request.method.clone(),
        url: entry.request.url.clone(),
        timestamp: Timestamp::parse_rfc3339(&entry.started_date_time),
        status: Some(entry.response.status),
        payload_types: Vec::new(),
        user_agent,
        body: entry.request.post_data.as_ref().map(|post| post.text.clone()),
    }
}
