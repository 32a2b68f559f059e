// crates/snare-router/src/router.rs
// ============================================================================
// Module: Snare Session Router
// Description: Pin, route, and unpin operations over an injected pin store.
// Purpose: Decide per request whether to serve production or the decoy.
// Dependencies: crate::{fingerprint, pins}, snare-core
// ============================================================================

//! ## Overview
//! The router exposes three operations: `pin` binds a session fingerprint to
//! the decoy for a bounded duration, `route` answers the per-request routing
//! decision, and `unpin` removes all pins for a session. Routed decoy
//! responses carry `X-Routed`, `X-Original-IP`, and `X-Session-Fingerprint`
//! headers for the capture layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use snare_core::Pin;
use snare_core::PinStore;
use snare_core::PinStoreError;
use snare_core::RouteTarget;
use snare_core::SessionId;
use snare_core::Timestamp;

use crate::fingerprint::derive_fingerprint;
use crate::fingerprint::request_fingerprint;

// ============================================================================
// SECTION: Route Types
// ============================================================================

/// Inputs to a routing decision.
#[derive(Debug, Clone, Default)]
pub struct RouteQuery {
    /// Explicit session identifier when the caller knows it.
    pub session_id: Option<SessionId>,
    /// Client IP address.
    pub client_ip: String,
    /// User agent header value.
    pub user_agent: String,
    /// Request cookies.
    pub cookies: BTreeMap<String, String>,
    /// Bearer token when presented.
    pub bearer_token: Option<String>,
}

/// Routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Chosen backend.
    pub target: RouteTarget,
    /// Backend base URL.
    pub backend_url: String,
    /// Headers the edge should add when forwarding.
    pub headers_to_add: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Session Router
// ============================================================================

/// Session router over an injected pin store.
pub struct SessionRouter {
    /// Pin store backing the routing state.
    pins: Arc<dyn PinStore>,
    /// Production backend URL.
    production_url: String,
    /// Decoy backend URL.
    decoy_url: String,
}

impl SessionRouter {
    /// Builds a router from its pin store and backend URLs.
    #[must_use]
    pub fn new(
        pins: Arc<dyn PinStore>,
        production_url: impl Into<String>,
        decoy_url: impl Into<String>,
    ) -> Self {
        Self {
            pins,
            production_url: production_url.into(),
            decoy_url: decoy_url.into(),
        }
    }

    /// Returns the pin store.
    #[must_use]
    pub fn pins(&self) -> &Arc<dyn PinStore> {
        &self.pins
    }

    /// Pins a session to the decoy for `ttl_hours`.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError`] when the pin store fails.
    pub fn pin(
        &self,
        session_id: &SessionId,
        client_ip: &str,
        reason: &str,
        ttl_hours: f64,
    ) -> Result<Pin, PinStoreError> {
        let now = Timestamp::now();
        let pin = Pin {
            fingerprint: derive_fingerprint(session_id, client_ip),
            session_id: session_id.clone(),
            client_ip: client_ip.to_string(),
            target: RouteTarget::Decoy,
            pinned_at: now,
            pinned_until: now.plus_hours(ttl_hours),
            reason: reason.to_string(),
        };
        self.pins.put(pin.clone())?;
        Ok(pin)
    }

    /// Answers the routing decision for one request.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError`] when the pin store fails.
    pub fn route(&self, query: &RouteQuery) -> Result<RouteDecision, PinStoreError> {
        let fingerprint = request_fingerprint(
            query.session_id.as_ref(),
            &query.client_ip,
            &query.user_agent,
            &query.cookies,
            query.bearer_token.as_deref(),
        );
        let now = Timestamp::now();
        if let Some(pin) = self.pins.get_live(&fingerprint, now)? {
            let mut headers = BTreeMap::new();
            headers.insert("X-Routed".to_string(), RouteTarget::Decoy.as_str().to_string());
            headers.insert("X-Original-IP".to_string(), query.client_ip.clone());
            headers
                .insert("X-Session-Fingerprint".to_string(), pin.fingerprint.as_str().to_string());
            return Ok(RouteDecision {
                target: RouteTarget::Decoy,
                backend_url: self.decoy_url.clone(),
                headers_to_add: headers,
            });
        }
        Ok(RouteDecision {
            target: RouteTarget::Production,
            backend_url: self.production_url.clone(),
            headers_to_add: BTreeMap::new(),
        })
    }

    /// Removes all pins for a session; returns the removed count.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError`] when the pin store fails.
    pub fn unpin(&self, session_id: &SessionId) -> Result<usize, PinStoreError> {
        self.pins.remove_session(session_id)
    }

    /// Lists live pins.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError`] when the pin store fails.
    pub fn sessions(&self) -> Result<Vec<Pin>, PinStoreError> {
        self.pins.list_live(Timestamp::now())
    }

    /// Finds the live pin for a session id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError`] when the pin store fails.
    pub fn session(&self, session_id: &SessionId) -> Result<Option<Pin>, PinStoreError> {
        Ok(self
            .pins
            .list_live(Timestamp::now())?
            .into_iter()
            .find(|pin| pin.session_id == *session_id))
    }
}
