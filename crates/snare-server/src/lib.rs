// crates/snare-server/src/lib.rs
// ============================================================================
// Module: Snare Server Library
// Description: HTTP service surfaces for inspector, router, and analysis.
// Purpose: Expose axum routers, auth, audit sinks, and serving helpers.
// Dependencies: axum, snare-inspect, snare-router, snare-analysis
// ============================================================================

//! ## Overview
//! Each Snare service is an axum router over injected state: the inspector
//! hosts inspection and rule management, the router hosts pin/route/unpin,
//! and the analysis service hosts profiling, simulation jobs, and rule
//! orchestration. Privileged endpoints require a bearer token or API key
//! checked in constant time; all decisions fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod analysis;
pub mod audit;
pub mod auth;
pub mod error;
pub mod inspector;
pub mod limits;
pub mod routing;
pub mod serve;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use analysis::AnalysisState;
pub use analysis::analysis_router;
pub use audit::FileAuditSink;
pub use audit::StderrAuditSink;
pub use audit::audit_event;
pub use auth::AuthPolicy;
pub use error::ApiError;
pub use inspector::InspectorState;
pub use inspector::inspector_router;
pub use limits::RateLimitDecision;
pub use limits::RateLimitSettings;
pub use limits::RateLimiter;
pub use routing::RouterState;
pub use routing::routing_router;
pub use serve::ServeError;
pub use serve::serve_until_shutdown;
