// crates/snare-server/src/error.rs
// ============================================================================
// Module: Snare API Errors
// Description: JSON error envelope with canonical status mapping.
// Purpose: Map domain failures onto the service status-code contract.
// Dependencies: axum, serde_json
// ============================================================================

//! ## Overview
//! Every error response is a JSON envelope `{"error": "..."}` with the
//! canonical status mapping: 400 bad input, 401 unauthenticated, 403
//! forbidden, 404 unknown, 409 conflict, 500 internal. Helper constructors
//! keep handlers terse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::auth::AuthError;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// JSON error envelope.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    /// 400 bad request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 404 not found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    /// 409 conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    /// 500 internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// 503 overloaded.
    #[must_use]
    pub fn overloaded() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "service overloaded".to_string(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::Missing => StatusCode::UNAUTHORIZED,
            AuthError::Rejected => StatusCode::FORBIDDEN,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
