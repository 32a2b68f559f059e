// crates/snare-router/tests/router.rs
// ============================================================================
// Module: Session Router Tests
// Description: Tests for pin, route, unpin, and lazy expiry.
// Purpose: Validate decoy routing headers and read-time eviction.
// Dependencies: snare-router, snare-core
// ============================================================================
//! ## Overview
//! A freshly pinned session routes to the decoy with the fingerprint header;
//! an expired pin is evicted on the first read and routes to production.

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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use snare_core::RouteTarget;
use snare_core::SessionId;
use snare_router::InMemoryPinStore;
use snare_router::RouteQuery;
use snare_router::SessionRouter;

const PRODUCTION: &str = "http://production-backend:8080";
const DECOY: &str = "http://decoy:8080";

fn router() -> SessionRouter {
    SessionRouter::new(Arc::new(InMemoryPinStore::new()), PRODUCTION, DECOY)
}

fn query(session: &str, ip: &str) -> RouteQuery {
    RouteQuery {
        session_id: Some(SessionId::new(session)),
        client_ip: ip.to_string(),
        user_agent: "Mozilla/5.0".to_string(),
        cookies: BTreeMap::new(),
        bearer_token: None,
    }
}

/// Verifies pin-then-route lands on the decoy with the fingerprint header.
#[test]
fn pinned_session_routes_to_decoy() {
    let router = router();
    let session = SessionId::new("sess_02");
    let pin = router.pin(&session, "203.0.113.50", "poi tagged", 24.0).unwrap();
    assert_eq!(pin.fingerprint.as_str().len(), 16);

    let decision = router.route(&query("sess_02", "203.0.113.50")).unwrap();
    assert_eq!(decision.target, RouteTarget::Decoy);
    assert_eq!(decision.backend_url, DECOY);
    assert_eq!(
        decision.headers_to_add.get("X-Session-Fingerprint"),
        Some(&pin.fingerprint.as_str().to_string())
    );
    assert_eq!(decision.headers_to_add.get("X-Routed"), Some(&"decoy".to_string()));
    assert_eq!(
        decision.headers_to_add.get("X-Original-IP"),
        Some(&"203.0.113.50".to_string())
    );
}

/// Verifies unpinned sessions route to production with no extra headers.
#[test]
fn unpinned_session_routes_to_production() {
    let router = router();
    let decision = router.route(&query("sess_unknown", "198.51.100.1")).unwrap();
    assert_eq!(decision.target, RouteTarget::Production);
    assert_eq!(decision.backend_url, PRODUCTION);
    assert!(decision.headers_to_add.is_empty());
}

/// Verifies expired pins are evicted on the first read.
#[test]
fn expired_pin_is_lazily_evicted() {
    let router = router();
    let session = SessionId::new("sess_expire");
    // 0.0001 hours is roughly a third of a second.
    router.pin(&session, "203.0.113.51", "short pin", 0.0001).unwrap();
    std::thread::sleep(Duration::from_secs(1));

    let decision = router.route(&query("sess_expire", "203.0.113.51")).unwrap();
    assert_eq!(decision.target, RouteTarget::Production);
    assert!(router.sessions().unwrap().is_empty());
}

/// Verifies unpin removes all pins for a session.
#[test]
fn unpin_removes_session_pins() {
    let router = router();
    let session = SessionId::new("sess_unpin");
    router.pin(&session, "203.0.113.52", "poi", 24.0).unwrap();
    assert_eq!(router.unpin(&session).unwrap(), 1);
    assert_eq!(router.unpin(&session).unwrap(), 0);
    let decision = router.route(&query("sess_unpin", "203.0.113.52")).unwrap();
    assert_eq!(decision.target, RouteTarget::Production);
}

/// Verifies repinning a fingerprint keeps at most one active pin.
#[test]
fn repin_replaces_existing_pin() {
    let router = router();
    let session = SessionId::new("sess_repin");
    router.pin(&session, "203.0.113.53", "first", 24.0).unwrap();
    router.pin(&session, "203.0.113.53", "second", 24.0).unwrap();
    let pins = router.sessions().unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].reason, "second");
}

/// Verifies session lookup by id.
#[test]
fn session_lookup_finds_live_pin() {
    let router = router();
    let session = SessionId::new("sess_lookup");
    router.pin(&session, "203.0.113.54", "poi", 24.0).unwrap();
    assert!(router.session(&session).unwrap().is_some());
    assert!(router.session(&SessionId::new("missing")).unwrap().is_none());
}
