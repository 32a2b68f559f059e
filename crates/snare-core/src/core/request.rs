// crates/snare-core/src/core/request.rs
// ============================================================================
// Module: Snare Request Envelope
// Description: Immutable HTTP request snapshot submitted for inspection.
// Purpose: Provide the single request representation shared by all stages.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RequestEnvelope`] is the immutable snapshot of one HTTP request for
//! the lifetime of one inspection: method, URL, headers, body, query
//! parameters, client IP, session identifier, and caller-supplied behavioral
//! metadata. The inspection engine never mutates it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SessionId;

// ============================================================================
// SECTION: Request Envelope
// ============================================================================

/// Immutable request snapshot for one inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// HTTP method (uppercase).
    pub method: String,
    /// Full request URL including query string.
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body as text (empty when absent).
    #[serde(default)]
    pub body: String,
    /// Parsed query parameters.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    /// Client IP address as presented at the edge.
    pub client_ip: String,
    /// Opaque session identifier.
    pub session_id: SessionId,
    /// Caller-supplied behavioral context (requests per second, error counts).
    #[serde(default)]
    pub metadata: BTreeMap<String, f64>,
}

impl RequestEnvelope {
    /// Returns the concatenation used for rule matching and pattern features.
    ///
    /// The shape is `URL␣body␣headers-as-JSON`; rule patterns are evaluated
    /// against exactly this text.
    #[must_use]
    pub fn match_text(&self) -> String {
        let headers_json =
            serde_json::to_string(&self.headers).unwrap_or_else(|_| String::from("{}"));
        format!("{} {} {}", self.url, self.body, headers_json)
    }

    /// Returns a named header value, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns the user agent header or an empty string.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or("")
    }
}
