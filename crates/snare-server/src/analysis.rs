// crates/snare-server/src/analysis.rs
// ============================================================================
// Module: Snare Analysis Service
// Description: HTTP surface for profiling, simulation, and rule policy.
// Purpose: Expose profile, simulate, rule-propose, and rule-apply endpoints.
// Dependencies: axum, snare-analysis, snare-core
// ============================================================================

//! ## Overview
//! The analysis service profiles sessions on demand, queues asynchronous
//! payload simulations onto the bounded worker pool, exposes simulation
//! results by job id, and hosts the rule propose/apply pair backed by the
//! policy orchestrator. Profiling and simulation are privileged; listing
//! generated rules and profiles is read-only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use snare_analysis::BehavioralProfiler;
use snare_analysis::CaptureRecord;
use snare_analysis::PolicyDecisionRecord;
use snare_analysis::PolicyOrchestrator;
use snare_analysis::RuleGenerator;
use snare_analysis::SimulationQueue;
use snare_core::AttackerProfile;
use snare_core::AuditSink;
use snare_core::DetonationEvidence;
use snare_core::JobId;
use snare_core::JobStatus;
use snare_core::PayloadArtifact;
use snare_core::PayloadKind;
use snare_core::ProfileStore;
use snare_core::RuleId;
use snare_core::SessionId;
use snare_core::SimulationVerdict;
use snare_core::Timestamp;
use snare_core::VerdictKind;
use snare_core::hashing::hash_bytes;
use tokio::sync::Semaphore;

use crate::audit::audit_event;
use crate::auth::AuthPolicy;
use crate::error::ApiError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared analysis service state.
pub struct AnalysisState {
    /// Behavioral profiler.
    pub profiler: BehavioralProfiler,
    /// Profile store.
    pub profiles: Arc<dyn ProfileStore>,
    /// Simulation job queue.
    pub queue: SimulationQueue,
    /// Rule generator.
    pub generator: RuleGenerator,
    /// Policy orchestrator.
    pub policy: Arc<PolicyOrchestrator>,
    /// Auth policy for privileged endpoints.
    pub auth: AuthPolicy,
    /// Audit sink for privileged mutations.
    pub audit: Arc<dyn AuditSink>,
    /// Inflight permits bounding concurrent submissions.
    pub inflight: Arc<Semaphore>,
}

/// Service label used in audit events.
const SERVICE: &str = "analysis";

/// Builds the analysis router.
#[must_use]
pub fn analysis_router(state: Arc<AnalysisState>) -> Router {
    Router::new()
        .route("/profile", post(profile_session))
        .route("/simulate", post(simulate_payload))
        .route("/sim-result/{id}", get(simulation_result))
        .route("/rule-propose", post(propose_rule))
        .route("/rule-apply", post(apply_rule))
        .route("/rules", get(list_rules))
        .route("/profiles", get(list_profiles))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Profile request envelope.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    /// Session to profile.
    pub session_id: SessionId,
    /// Captured requests.
    pub captures: Vec<CaptureRecord>,
}

/// Payload submitted for simulation or rule proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct PayloadInput {
    /// Payload classification.
    #[serde(rename = "type")]
    pub payload_type: PayloadKind,
    /// Raw payload content.
    pub value: String,
    /// Where the payload was found.
    #[serde(default)]
    pub location: Option<String>,
    /// Extraction confidence.
    #[serde(default = "default_payload_confidence")]
    pub confidence: f64,
}

/// Serde default for payload confidence.
const fn default_payload_confidence() -> f64 {
    0.5
}

impl PayloadInput {
    /// Converts the wire payload into a payload artifact.
    fn into_artifact(self) -> PayloadArtifact {
        let checksum = hash_bytes(self.value.as_bytes());
        PayloadArtifact {
            artifact_id: "payload_adhoc".to_string(),
            payload_type: self.payload_type,
            payload_value: self.value,
            location: self.location.unwrap_or_else(|| "request".to_string()),
            confidence: self.confidence,
            file_path: None,
            checksum,
        }
    }
}

/// Simulation request envelope.
#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    /// Payload to detonate.
    pub payload: PayloadInput,
    /// Shadow application reference.
    #[serde(default = "default_shadow_ref")]
    pub shadow_app_ref: String,
    /// Session the payload came from, when known.
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

/// Serde default for the shadow reference.
fn default_shadow_ref() -> String {
    "main".to_string()
}

/// Simulation job acknowledgement.
#[derive(Debug, Serialize)]
struct SimulateResponse {
    /// Queued job identifier.
    job_id: JobId,
    /// Job status at submission.
    status: JobStatus,
    /// Human-readable note.
    message: &'static str,
}

/// Detonation summary accepted by rule proposal.
#[derive(Debug, Deserialize)]
pub struct SimResultInput {
    /// Detonation verdict.
    pub verdict: VerdictKind,
    /// Detonation severity.
    pub severity: f64,
    /// Attack type, defaulting to the payload's own classification.
    #[serde(default)]
    pub attack_type: Option<PayloadKind>,
    /// Originating simulation identifier.
    #[serde(default)]
    pub simulation_id: Option<String>,
}

/// Rule proposal envelope.
#[derive(Debug, Deserialize)]
pub struct RuleProposeRequest {
    /// Payload the rule generalizes.
    pub payload: PayloadInput,
    /// Detonation summary.
    pub sim_result: SimResultInput,
    /// Attacker profile for confidence context.
    #[serde(default)]
    pub profile: Option<AttackerProfile>,
}

/// Rule apply envelope.
#[derive(Debug, Deserialize)]
pub struct RuleApplyRequest {
    /// Rule to apply.
    pub rule_id: RuleId,
    /// Force auto-application regardless of confidence.
    #[serde(default)]
    pub force: bool,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Profiles one session from submitted captures (privileged).
async fn profile_session(
    State(state): State<Arc<AnalysisState>>,
    headers: HeaderMap,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth.authorize(&headers)?;
    let profile = state.profiler.analyze_session(&request.session_id, &request.captures);
    state.profiles.put(profile.clone()).map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(serde_json::json!({
        "session_id": request.session_id,
        "profile": profile,
    })))
}

/// Queues a payload detonation (privileged).
async fn simulate_payload(
    State(state): State<Arc<AnalysisState>>,
    headers: HeaderMap,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    state.auth.authorize(&headers)?;
    let Ok(_permit) = state.inflight.try_acquire() else {
        return Err(ApiError::overloaded());
    };
    let job_id = state
        .queue
        .submit(request.payload.into_artifact(), &request.shadow_app_ref, request.session_id)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    state.audit.record(audit_event(
        SERVICE,
        "simulation_queued",
        serde_json::json!({ "job_id": &job_id }),
    ));
    Ok(Json(SimulateResponse {
        job_id,
        status: JobStatus::Queued,
        message: "simulation queued for execution",
    }))
}

/// Fetches one simulation record.
async fn simulation_result(
    State(state): State<Arc<AnalysisState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let job_id = JobId::new(id);
    state
        .queue
        .store()
        .get(&job_id)
        .map_err(|err| ApiError::internal(err.to_string()))?
        .map(|record| Json(serde_json::json!(record)))
        .ok_or_else(|| ApiError::not_found("simulation not found"))
}

/// Synthesizes a rule from a detonation summary without applying it.
async fn propose_rule(
    State(state): State<Arc<AnalysisState>>,
    Json(request): Json<RuleProposeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let artifact = request.payload.into_artifact();
    let verdict = SimulationVerdict {
        verdict: request.sim_result.verdict,
        severity: request.sim_result.severity,
        attack_type: request.sim_result.attack_type.unwrap_or(artifact.payload_type),
        evidence: DetonationEvidence::default(),
        reproduction_steps: Vec::new(),
        execution_time_ms: 0,
        error: None,
    };
    let rule = state
        .generator
        .generate_rule(
            &artifact,
            &verdict,
            request.profile.as_ref(),
            request.sim_result.simulation_id.as_deref(),
        )
        .ok_or_else(|| ApiError::bad_request("cannot generate rule for this payload/result"))?;
    state.policy.rules().put(rule.clone());
    let recommendation = state.policy.orchestrate(&rule, false);
    Ok(Json(serde_json::json!({
        "rule": rule,
        "recommendation": recommendation.outcome,
        "reason": recommendation.reason,
    })))
}

/// Applies a previously proposed rule (privileged).
async fn apply_rule(
    State(state): State<Arc<AnalysisState>>,
    headers: HeaderMap,
    Json(request): Json<RuleApplyRequest>,
) -> Result<Json<PolicyDecisionRecord>, ApiError> {
    state.auth.authorize(&headers)?;
    let rule = state
        .policy
        .rules()
        .get(&request.rule_id)
        .ok_or_else(|| ApiError::not_found("rule not found"))?;
    let decision = state.policy.apply(&rule, request.force).await;
    state.audit.record(audit_event(
        SERVICE,
        "rule_applied",
        serde_json::json!({
            "rule_id": &decision.rule_id,
            "outcome": decision.outcome,
            "forced": request.force,
        }),
    ));
    Ok(Json(decision))
}

/// Lists generated rules with their dispositions.
async fn list_rules(State(state): State<Arc<AnalysisState>>) -> Json<serde_json::Value> {
    let rules: Vec<serde_json::Value> = state
        .policy
        .rules()
        .list()
        .into_iter()
        .map(|(rule, outcome)| serde_json::json!({ "rule": rule, "disposition": outcome }))
        .collect();
    let count = rules.len();
    Json(serde_json::json!({ "rules": rules, "count": count }))
}

/// Lists attacker profiles.
async fn list_profiles(
    State(state): State<Arc<AnalysisState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profiles = state.profiles.list().map_err(|err| ApiError::internal(err.to_string()))?;
    let count = profiles.len();
    Ok(Json(serde_json::json!({ "profiles": profiles, "count": count })))
}

/// Health probe.
async fn health(State(state): State<Arc<AnalysisState>>) -> Json<serde_json::Value> {
    let simulations = state.queue.store().list().map(|records| records.len()).unwrap_or(0);
    Json(serde_json::json!({
        "status": "healthy",
        "service": "analysis",
        "timestamp": Timestamp::now(),
        "simulations": simulations,
        "rules_generated": state.policy.rules().len(),
        "profiles": state.profiles.list().map(|p| p.len()).unwrap_or(0),
    }))
}

/// Service statistics.
async fn stats(
    State(state): State<Arc<AnalysisState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let records = state.queue.store().list().map_err(|err| ApiError::internal(err.to_string()))?;
    let completed = records.iter().filter(|r| r.status == JobStatus::Completed).count();
    let exploits = records
        .iter()
        .filter(|r| {
            r.verdict.as_ref().is_some_and(|v| v.verdict == VerdictKind::ExploitPossible)
        })
        .count();
    Ok(Json(serde_json::json!({
        "total_simulations": records.len(),
        "completed_simulations": completed,
        "exploits_detected": exploits,
        "rules_generated": state.policy.rules().len(),
    })))
}
