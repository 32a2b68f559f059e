// crates/snare-server/src/inspector.rs
// ============================================================================
// Module: Snare Inspector Service
// Description: HTTP surface for inspection and rule management.
// Purpose: Expose inspect, rule CRUD, health, and stats endpoints.
// Dependencies: axum, snare-inspect, snare-core
// ============================================================================

//! ## Overview
//! The inspector service answers `POST /inspect` on the hot path and hosts
//! rule management on a privileged admin path: create, list, get, delete,
//! and toggle. Rule creation returns 201 and rejects duplicate identifiers
//! with 409. Inspection is rate limited per client IP; rule pushes from the
//! analysis service arrive on the admin path and never contend with
//! inspections for locks beyond the rule-set write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use serde::Deserialize;
use serde::Serialize;
use snare_core::AuditSink;
use snare_core::Decision;
use snare_core::MetricOutcome;
use snare_core::RequestEnvelope;
use snare_core::Rule;
use snare_core::RuleId;
use snare_core::RuleStore;
use snare_core::RuleStoreError;
use snare_core::ServiceMetrics;
use snare_core::Timestamp;
use snare_inspect::InspectionEngine;
use tokio::sync::Semaphore;

use crate::audit::audit_event;
use crate::auth::AuthPolicy;
use crate::error::ApiError;
use crate::limits::RateLimitDecision;
use crate::limits::RateLimiter;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared inspector service state.
pub struct InspectorState {
    /// Inspection engine.
    pub engine: Arc<InspectionEngine>,
    /// Auth policy for privileged endpoints.
    pub auth: AuthPolicy,
    /// Per-client rate limiter for the inspect path.
    pub limiter: RateLimiter,
    /// Audit sink for privileged mutations.
    pub audit: Arc<dyn AuditSink>,
    /// Metrics sink for the hot path.
    pub metrics: Arc<dyn ServiceMetrics>,
    /// Inflight permits bounding concurrent inspections.
    pub inflight: Arc<Semaphore>,
}

/// Service label used in audit and metric events.
const SERVICE: &str = "inspector";

/// Builds the inspector router.
#[must_use]
pub fn inspector_router(state: Arc<InspectorState>) -> Router {
    Router::new()
        .route("/inspect", post(inspect))
        .route("/rules", post(create_rule).get(list_rules))
        .route("/rules/{id}", get(get_rule).delete(delete_rule))
        .route("/rules/{id}/toggle", put(toggle_rule))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Rule creation envelope.
#[derive(Debug, Deserialize)]
pub struct RuleCreateRequest {
    /// Rule to admit.
    pub rule: Rule,
}

/// Rule creation acknowledgement.
#[derive(Debug, Serialize)]
struct RuleCreateResponse {
    /// Admitted rule identifier.
    rule_id: RuleId,
    /// Stable status label.
    status: &'static str,
}

/// Rule list envelope.
#[derive(Debug, Serialize)]
struct RuleListResponse {
    /// Enabled rules.
    rules: Vec<Rule>,
    /// Number of enabled rules.
    count: usize,
}

/// Toggle query parameters.
#[derive(Debug, Deserialize)]
struct ToggleParams {
    /// Desired enabled state.
    enabled: bool,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Inspects one request.
async fn inspect(
    State(state): State<Arc<InspectorState>>,
    Json(request): Json<RequestEnvelope>,
) -> Result<Json<Decision>, ApiError> {
    let Ok(_permit) = state.inflight.try_acquire() else {
        state.metrics.record_request(SERVICE, "/inspect", MetricOutcome::Error);
        return Err(ApiError::overloaded());
    };
    match state.limiter.check(&request.client_ip) {
        RateLimitDecision::Allow => {}
        RateLimitDecision::Limited | RateLimitDecision::OverCapacity => {
            state.metrics.record_request(SERVICE, "/inspect", MetricOutcome::Error);
            return Err(ApiError::overloaded());
        }
    }
    let started = std::time::Instant::now();
    let decision = state.engine.inspect(&request).await;
    state.metrics.record_request(SERVICE, "/inspect", MetricOutcome::Ok);
    state.metrics.record_latency_ms(
        SERVICE,
        "/inspect",
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
    Ok(Json(decision))
}

/// Admits a new rule (privileged).
async fn create_rule(
    State(state): State<Arc<InspectorState>>,
    headers: HeaderMap,
    Json(request): Json<RuleCreateRequest>,
) -> Result<(StatusCode, Json<RuleCreateResponse>), ApiError> {
    state.auth.authorize(&headers)?;
    let rule_id = request.rule.rule_id.clone();
    state.engine.rules().create(request.rule).map_err(map_rule_error)?;
    tracing::info!(rule_id = %rule_id, "rule created");
    state.audit.record(audit_event(
        SERVICE,
        "rule_created",
        serde_json::json!({ "rule_id": &rule_id }),
    ));
    Ok((StatusCode::CREATED, Json(RuleCreateResponse {
        rule_id,
        status: "created",
    })))
}

/// Lists enabled rules.
async fn list_rules(
    State(state): State<Arc<InspectorState>>,
) -> Result<Json<RuleListResponse>, ApiError> {
    let rules: Vec<Rule> = state
        .engine
        .rules()
        .list()
        .map_err(map_rule_error)?
        .into_iter()
        .filter(|rule| rule.enabled)
        .collect();
    let count = rules.len();
    Ok(Json(RuleListResponse {
        rules,
        count,
    }))
}

/// Fetches one rule.
async fn get_rule(
    State(state): State<Arc<InspectorState>>,
    Path(id): Path<String>,
) -> Result<Json<Rule>, ApiError> {
    let rule_id = RuleId::new(id);
    state
        .engine
        .rules()
        .get(&rule_id)
        .map_err(map_rule_error)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("rule not found"))
}

/// Deletes one rule (privileged).
async fn delete_rule(
    State(state): State<Arc<InspectorState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth.authorize(&headers)?;
    let rule_id = RuleId::new(id);
    state.engine.rules().delete(&rule_id).map_err(map_rule_error)?;
    tracing::info!(rule_id = %rule_id, "rule deleted");
    state.audit.record(audit_event(
        SERVICE,
        "rule_deleted",
        serde_json::json!({ "rule_id": &rule_id }),
    ));
    Ok(Json(serde_json::json!({ "rule_id": rule_id, "status": "deleted" })))
}

/// Enables or disables one rule (privileged).
async fn toggle_rule(
    State(state): State<Arc<InspectorState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<ToggleParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth.authorize(&headers)?;
    let rule_id = RuleId::new(id);
    state.engine.rules().set_enabled(&rule_id, params.enabled).map_err(map_rule_error)?;
    Ok(Json(serde_json::json!({
        "rule_id": rule_id,
        "enabled": params.enabled,
        "status": "updated",
    })))
}

/// Health probe.
async fn health(State(state): State<Arc<InspectorState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "inspector",
        "timestamp": Timestamp::now(),
        "active_rules": state.engine.rules().enabled_count(),
        "tracked_sessions": state.engine.windows().session_count(),
    }))
}

/// Service statistics.
async fn stats(State(state): State<Arc<InspectorState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let all = state.engine.rules().list().map_err(map_rule_error)?;
    let enabled = all.iter().filter(|rule| rule.enabled).count();
    Ok(Json(serde_json::json!({
        "active_rules": enabled,
        "total_rules": all.len(),
        "active_sessions": state.engine.windows().session_count(),
    })))
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Maps rule store errors onto the status contract.
fn map_rule_error(err: RuleStoreError) -> ApiError {
    match err {
        RuleStoreError::Duplicate(message) => ApiError::conflict(message),
        RuleStoreError::NotFound(message) => ApiError::not_found(message),
        RuleStoreError::Invalid(message) => ApiError::bad_request(message),
        RuleStoreError::Store(message) => ApiError::internal(message),
    }
}
