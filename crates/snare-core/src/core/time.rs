// crates/snare-core/src/core/time.rs
// ============================================================================
// Module: Snare Timestamps
// Description: UTC wall-clock timestamps with ISO-8601 serialization.
// Purpose: Provide one timestamp representation for pins, HAR logs, and events.
// Dependencies: chrono, serde
// ============================================================================

//! ## Overview
//! Snare timestamps wrap `chrono::DateTime<Utc>` so that pins, HAR entries,
//! and bus events all serialize as ISO-8601 UTC strings. Comparisons are
//! plain instant ordering; there is no logical-clock mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing UTC instant.
    #[must_use]
    pub const fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value)
    }

    /// Returns the inner UTC instant.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns this instant advanced by a fractional number of hours.
    ///
    /// Saturates at the representable bounds rather than wrapping.
    #[must_use]
    pub fn plus_hours(&self, hours: f64) -> Self {
        let millis = (hours * 3_600_000.0).round();
        let clamped = if millis.is_finite() {
            millis.clamp(i64::MIN as f64, i64::MAX as f64)
        } else {
            0.0
        };
        #[allow(clippy::cast_possible_truncation, reason = "value is clamped to i64 range above")]
        let delta = Duration::milliseconds(clamped as i64);
        Self(self.0.checked_add_signed(delta).unwrap_or(self.0))
    }

    /// Returns the whole milliseconds elapsed since an earlier instant.
    #[must_use]
    pub fn millis_since(&self, earlier: &Self) -> i64 {
        self.0.signed_duration_since(earlier.0).num_milliseconds()
    }

    /// Returns the elapsed seconds since an earlier instant as a float.
    #[must_use]
    pub fn seconds_since(&self, earlier: &Self) -> f64 {
        #[allow(clippy::cast_precision_loss, reason = "session durations are far below 2^52 ms")]
        let millis = self.millis_since(earlier) as f64;
        millis / 1000.0
    }

    /// Formats the timestamp as an ISO-8601 UTC string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Parses an ISO-8601 timestamp, normalizing to UTC.
    #[must_use]
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value).ok().map(|parsed| Self(parsed.with_timezone(&Utc)))
    }
}
