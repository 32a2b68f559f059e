// crates/snare-server/src/serve.rs
// ============================================================================
// Module: Snare Serving Helper
// Description: Binds and serves an axum router until shutdown.
// Purpose: Share the bind/serve/shutdown plumbing across the services.
// Dependencies: axum, tokio
// ============================================================================

//! ## Overview
//! One serving helper for all three services: parse the bind address, bind a
//! TCP listener, and serve the router until the provided shutdown future
//! resolves. In-flight requests complete before the task returns.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Serving errors.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The bind address was invalid.
    #[error("invalid bind address: {0}")]
    InvalidBind(String),
    /// The listener could not be bound.
    #[error("bind failed: {0}")]
    Bind(String),
    /// The server failed while running.
    #[error("server failed: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Serves a router on the given bind address until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServeError`] when binding or serving fails.
pub async fn serve_until_shutdown(
    router: Router,
    bind: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServeError> {
    let addr: SocketAddr = bind.parse().map_err(|_| ServeError::InvalidBind(bind.to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ServeError::Bind(err.to_string()))?;
    tracing::info!(%addr, "service listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| ServeError::Serve(err.to_string()))
}
