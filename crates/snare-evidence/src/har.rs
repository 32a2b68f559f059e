// crates/snare-evidence/src/har.rs
// ============================================================================
// Module: Snare HAR Model
// Description: HTTP Archive v1.2 structures for captured sessions.
// Purpose: Serialize request/response pairs in the HAR wire format.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A trimmed HAR v1.2 model covering what the decoy capture layer records:
//! entries with `startedDateTime` (ISO-8601 UTC), timing in milliseconds,
//! request and response shapes, and send/wait/receive timings. Response
//! bodies above the retention limit are dropped from `content.text` but keep
//! their true sizes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HAR format version emitted by the builder.
pub const HAR_VERSION: &str = "1.2";
/// Response bodies at or above this size are not retained inline.
pub const MAX_INLINE_RESPONSE_BYTES: usize = 10_000;
/// Retained prefix length for inline response bodies.
pub const INLINE_RESPONSE_PREFIX: usize = 1_000;

// ============================================================================
// SECTION: HAR Structures
// ============================================================================

/// One named header in HAR shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarHeader {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Posted body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarPostData {
    /// Raw posted text.
    pub text: String,
}

/// HAR request record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarRequest {
    /// HTTP method.
    pub method: String,
    /// Full URL.
    pub url: String,
    /// HTTP protocol version.
    pub http_version: String,
    /// Request headers.
    pub headers: Vec<HarHeader>,
    /// Request body size in bytes.
    pub body_size: i64,
    /// Posted body, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_data: Option<HarPostData>,
}

/// HAR response content record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarContent {
    /// Body size in bytes.
    pub size: i64,
    /// MIME type of the body.
    pub mime_type: String,
    /// Retained body text, when small enough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// HAR response record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarResponse {
    /// HTTP status code.
    pub status: u16,
    /// Status text.
    pub status_text: String,
    /// HTTP protocol version.
    pub http_version: String,
    /// Response headers.
    pub headers: Vec<HarHeader>,
    /// Response body size in bytes.
    pub body_size: i64,
    /// Response content.
    pub content: HarContent,
}

/// HAR timing record in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarTimings {
    /// Time writing the request.
    pub send: f64,
    /// Time waiting for the first response byte.
    pub wait: f64,
    /// Time reading the response.
    pub receive: f64,
}

/// One request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarEntry {
    /// Request start instant, ISO-8601 UTC.
    pub started_date_time: String,
    /// Total entry time in milliseconds.
    pub time: f64,
    /// Request record.
    pub request: HarRequest,
    /// Response record.
    pub response: HarResponse,
    /// Phase timings.
    pub timings: HarTimings,
}

/// HAR creator record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarCreator {
    /// Creating component name.
    pub name: String,
    /// Creating component version.
    pub version: String,
}

/// HAR log of one captured session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarLog {
    /// HAR format version.
    pub version: String,
    /// Creator record.
    pub creator: HarCreator,
    /// Ordered entries.
    pub entries: Vec<HarEntry>,
}

impl Default for HarLog {
    fn default() -> Self {
        Self {
            version: HAR_VERSION.to_string(),
            creator: HarCreator {
                name: "snare-decoy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            entries: Vec::new(),
        }
    }
}

impl HarLog {
    /// Returns the retained response text for a body of the given size.
    #[must_use]
    pub fn inline_response_text(body: &str) -> Option<String> {
        if body.len() < MAX_INLINE_RESPONSE_BYTES {
            Some(body.chars().take(INLINE_RESPONSE_PREFIX).collect())
        } else {
            None
        }
    }
}
