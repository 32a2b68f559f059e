// crates/snare-server/src/routing.rs
// ============================================================================
// Module: Snare Router Service
// Description: HTTP surface for session pinning and routing decisions.
// Purpose: Expose pin, route, session listing, and unpin endpoints.
// Dependencies: axum, snare-router, snare-core
// ============================================================================

//! ## Overview
//! The router service pins tagged sessions to the decoy, answers per-request
//! routing decisions for the edge proxy, and lists live pins. Pinning and
//! unpinning are privileged; routing is on the hot path and unauthenticated.
//! Each pin emits a session-pinned event on the telemetry topic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use snare_core::AuditSink;
use snare_core::EventId;
use snare_core::Fingerprint;
use snare_core::Pin;
use snare_core::RouteTarget;
use snare_core::SessionId;
use snare_core::Timestamp;
use snare_core::TopicBus;
use snare_router::RouteQuery;
use snare_router::SessionRouter;
use tokio::sync::Semaphore;

use crate::audit::audit_event;
use crate::auth::AuthPolicy;
use crate::error::ApiError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Topic pin events are emitted on.
const TELEMETRY_TOPIC: &str = "telemetry";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared router service state.
pub struct RouterState {
    /// Session router.
    pub router: SessionRouter,
    /// Auth policy for privileged endpoints.
    pub auth: AuthPolicy,
    /// Bus for pin events.
    pub bus: Arc<dyn TopicBus>,
    /// Default pin duration in hours.
    pub default_pin_hours: f64,
    /// Audit sink for privileged mutations.
    pub audit: Arc<dyn AuditSink>,
    /// Inflight permits bounding concurrent routing decisions.
    pub inflight: Arc<Semaphore>,
}

/// Service label used in audit events.
const SERVICE: &str = "router";

/// Builds the router-service router.
#[must_use]
pub fn routing_router(state: Arc<RouterState>) -> Router {
    Router::new()
        .route("/pin", post(pin_session))
        .route("/route", post(route_request))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/pin/{id}", delete(unpin_session))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Pin request envelope.
#[derive(Debug, Deserialize)]
pub struct PinRequest {
    /// Session to pin.
    pub session_id: SessionId,
    /// Client IP observed at tag time.
    pub client_ip: String,
    /// Reason for the pin.
    pub reason: String,
    /// Pin duration in hours; the configured default when absent.
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

/// Pin acknowledgement.
#[derive(Debug, Serialize)]
struct PinResponse {
    /// Pinned session.
    session_id: SessionId,
    /// Derived fingerprint.
    fingerprint: Fingerprint,
    /// Routing target while pinned.
    target: RouteTarget,
    /// Expiry instant.
    pinned_until: Timestamp,
    /// Emitted pin event identifier.
    event_id: EventId,
}

/// Route request envelope.
#[derive(Debug, Deserialize, Default)]
pub struct RouteRequest {
    /// Explicit session identifier, when known.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Client IP address.
    pub client_ip: String,
    /// User agent header value.
    #[serde(default)]
    pub user_agent: String,
    /// Request cookies.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Bearer token when presented.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Routing decision envelope.
#[derive(Debug, Serialize)]
struct RouteResponse {
    /// Chosen backend.
    target: RouteTarget,
    /// Backend base URL.
    backend_url: String,
    /// Headers the edge should add.
    additional_headers: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Pins a session to the decoy (privileged).
async fn pin_session(
    State(state): State<Arc<RouterState>>,
    headers: HeaderMap,
    Json(request): Json<PinRequest>,
) -> Result<Json<PinResponse>, ApiError> {
    state.auth.authorize(&headers)?;
    let ttl_hours = request.duration_hours.unwrap_or(state.default_pin_hours);
    if ttl_hours <= 0.0 {
        return Err(ApiError::bad_request("duration_hours must be positive"));
    }
    let pin = state
        .router
        .pin(&request.session_id, &request.client_ip, &request.reason, ttl_hours)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    let event_id = emit_pin_event(&state, &pin, ttl_hours).await;
    state.audit.record(audit_event(
        SERVICE,
        "session_pinned",
        serde_json::json!({
            "session_id": &pin.session_id,
            "fingerprint": &pin.fingerprint,
            "reason": &pin.reason,
        }),
    ));
    tracing::info!(
        session_id = %pin.session_id,
        fingerprint = %pin.fingerprint,
        "session pinned to decoy"
    );
    Ok(Json(PinResponse {
        session_id: pin.session_id,
        fingerprint: pin.fingerprint,
        target: pin.target,
        pinned_until: pin.pinned_until,
        event_id,
    }))
}

/// Answers the routing decision for one request.
async fn route_request(
    State(state): State<Arc<RouterState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Ok(_permit) = state.inflight.try_acquire() else {
        return Err(ApiError::overloaded());
    };
    let decision = state
        .router
        .route(&RouteQuery {
            session_id: request.session_id,
            client_ip: request.client_ip,
            user_agent: request.user_agent,
            cookies: request.cookies,
            bearer_token: request.bearer_token,
        })
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(RouteResponse {
        target: decision.target,
        backend_url: decision.backend_url,
        additional_headers: decision.headers_to_add,
    }))
}

/// Lists live pins.
async fn list_sessions(State(state): State<Arc<RouterState>>) -> Result<Json<Vec<Pin>>, ApiError> {
    state.router.sessions().map(Json).map_err(|err| ApiError::internal(err.to_string()))
}

/// Fetches the live pin for one session.
async fn get_session(
    State(state): State<Arc<RouterState>>,
    Path(id): Path<String>,
) -> Result<Json<Pin>, ApiError> {
    state
        .router
        .session(&SessionId::new(id))
        .map_err(|err| ApiError::internal(err.to_string()))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("session not found"))
}

/// Removes all pins for a session (privileged).
async fn unpin_session(
    State(state): State<Arc<RouterState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.auth.authorize(&headers)?;
    let session_id = SessionId::new(id);
    let removed = state
        .router
        .unpin(&session_id)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    if removed == 0 {
        return Err(ApiError::not_found("session not found"));
    }
    state.audit.record(audit_event(
        SERVICE,
        "session_unpinned",
        serde_json::json!({ "session_id": &session_id, "removed": removed }),
    ));
    tracing::info!(session_id = %session_id, removed, "session unpinned");
    Ok(Json(serde_json::json!({ "session_id": session_id, "status": "unpinned" })))
}

/// Health probe.
async fn health(State(state): State<Arc<RouterState>>) -> Json<serde_json::Value> {
    let pinned = state.router.sessions().map(|pins| pins.len()).unwrap_or(0);
    Json(serde_json::json!({
        "status": "healthy",
        "service": "router",
        "timestamp": Timestamp::now(),
        "pinned_sessions": pinned,
    }))
}

/// Service statistics.
async fn stats(State(state): State<Arc<RouterState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let pins = state.router.sessions().map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(serde_json::json!({
        "active_pins": pins.len(),
    })))
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Emits a session-pinned event and returns its id.
async fn emit_pin_event(state: &RouterState, pin: &Pin, ttl_hours: f64) -> EventId {
    let event_id = EventId::generate();
    let payload = serde_json::json!({
        "event": "session_pinned",
        "event_id": &event_id,
        "session_id": &pin.session_id,
        "client_ip": &pin.client_ip,
        "fingerprint": &pin.fingerprint,
        "target": pin.target,
        "pin_duration_hours": ttl_hours,
        "reason": &pin.reason,
        "timestamp": Timestamp::now(),
    });
    let bytes = serde_json::to_vec(&payload).unwrap_or_default();
    if let Err(err) = state.bus.publish(TELEMETRY_TOPIC, pin.session_id.as_str(), bytes).await {
        tracing::warn!(error = %err, "pin event publish failed");
    }
    event_id
}
