// crates/snare-server/src/auth.rs
// ============================================================================
// Module: Snare Service Auth
// Description: Bearer-token and API-key authentication for privileged calls.
// Purpose: Provide strict, fail-closed auth with constant-time comparison.
// Dependencies: axum, subtle
// ============================================================================

//! ## Overview
//! Privileged endpoints accept either `Authorization: Bearer <token>` or an
//! `X-Api-Key` header. Tokens are compared in constant time. With no tokens
//! configured the policy enters a local-permissive mode intended for
//! single-host development; a warning is emitted once at startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted authorization header length.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;
/// API key header name.
const API_KEY_HEADER: &str = "X-Api-Key";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was presented.
    #[error("authentication required")]
    Missing,
    /// A credential was presented but did not match.
    #[error("credential rejected")]
    Rejected,
}

// ============================================================================
// SECTION: Auth Policy
// ============================================================================

/// Static-token authentication policy.
pub struct AuthPolicy {
    /// Accepted tokens; empty means local-permissive mode.
    tokens: Vec<String>,
}

impl AuthPolicy {
    /// Builds a policy from the configured tokens.
    #[must_use]
    pub fn new(tokens: Vec<String>) -> Self {
        if tokens.is_empty() {
            tracing::warn!(
                "no auth tokens configured; privileged endpoints are open (local mode only)"
            );
        }
        Self {
            tokens,
        }
    }

    /// Authorizes a privileged request from its headers.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Missing`] when no credential is presented and
    /// [`AuthError::Rejected`] when the credential does not match.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        let presented = extract_credential(headers).ok_or(AuthError::Missing)?;
        if presented.len() > MAX_AUTH_HEADER_BYTES {
            return Err(AuthError::Rejected);
        }
        let matched = self
            .tokens
            .iter()
            .any(|token| token.as_bytes().ct_eq(presented.as_bytes()).unwrap_u8() == 1);
        if matched { Ok(()) } else { Err(AuthError::Rejected) }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Pulls the bearer token or API key from request headers.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let raw = value.to_str().ok()?;
        if let Some(token) = raw.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
        return None;
    }
    headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok()).map(str::to_string)
}
