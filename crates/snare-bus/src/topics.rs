// crates/snare-bus/src/topics.rs
// ============================================================================
// Module: Snare Topic Names
// Description: Canonical topic names for cross-service messaging.
// Purpose: Keep producers and consumers agreeing on topic identity.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Topic names are stable wire contracts shared by every service.

/// Evidence pointer announcements, keyed by event id.
pub const TOPIC_EVIDENCE_READY: &str = "evidence-ready";
/// Schema-free telemetry envelopes, keyed by session id.
pub const TOPIC_TELEMETRY: &str = "telemetry";
/// Security alert envelopes, keyed by event id.
pub const TOPIC_ALERTS: &str = "alerts";
