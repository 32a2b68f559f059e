// crates/snare-server/src/limits.rs
// ============================================================================
// Module: Snare Request Limits
// Description: Token-bucket rate limiting for hot service endpoints.
// Purpose: Bound per-client request rates while absorbing honest bursts.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Hot endpoints key their limits by client IP. Scanners show up as a
//! sustained flood from one address while legitimate clients arrive in short
//! bursts, so each client gets a token bucket: the burst capacity absorbs a
//! page-load worth of requests and the refill rate clamps sustained
//! throughput. A bucket whose tokens would have fully refilled carries no
//! information and is reclaimed when the tracked-client cap is hit; past the
//! cap the limiter fails closed. Inflight concurrency is bounded separately
//! by a semaphore owned by each service state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Rate limiter settings.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    /// Requests a client may burst before throttling engages.
    pub burst: u32,
    /// Sustained requests per second refilled into each bucket.
    pub per_second: f64,
    /// Maximum tracked client buckets.
    pub max_entries: usize,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            burst: 200,
            per_second: 100.0,
            max_entries: 4_096,
        }
    }
}

/// Token bucket for one client.
struct Bucket {
    /// Tokens available as of `refreshed`.
    tokens: f64,
    /// Instant the token count was last brought current.
    refreshed: Instant,
}

impl Bucket {
    /// Brings the token count current against the refill rate.
    fn refill(&mut self, now: Instant, settings: &RateLimitSettings) {
        let elapsed = now.duration_since(self.refreshed).as_secs_f64();
        self.tokens = (elapsed * settings.per_second + self.tokens).min(f64::from(settings.burst));
        self.refreshed = now;
    }

    /// Returns true when the bucket would be indistinguishable from a fresh
    /// one, which makes it safe to reclaim.
    fn is_reclaimable(&self, now: Instant, settings: &RateLimitSettings) -> bool {
        let elapsed = now.duration_since(self.refreshed).as_secs_f64();
        elapsed * settings.per_second + self.tokens >= f64::from(settings.burst)
    }
}

/// Decision returned by the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Allow the request.
    Allow,
    /// Reject the request until the bucket refills.
    Limited,
    /// Reject because the limiter is tracking too many clients.
    OverCapacity,
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Per-client token-bucket rate limiter.
pub struct RateLimiter {
    /// Limiter settings.
    settings: RateLimitSettings,
    /// Buckets keyed by client IP.
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    /// Creates a limiter from settings.
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Spends one token for the client, refilling its bucket first.
    pub fn check(&self, client_ip: &str) -> RateLimitDecision {
        let now = Instant::now();
        let Ok(mut buckets) = self.buckets.lock() else {
            return RateLimitDecision::OverCapacity;
        };
        if !buckets.contains_key(client_ip) && buckets.len() >= self.settings.max_entries {
            // Reclaim buckets that have fully refilled; they hold no state a
            // fresh bucket would not.
            let settings = self.settings;
            buckets.retain(|_, bucket| !bucket.is_reclaimable(now, &settings));
            if buckets.len() >= self.settings.max_entries {
                return RateLimitDecision::OverCapacity;
            }
        }
        let bucket = buckets.entry(client_ip.to_string()).or_insert(Bucket {
            tokens: f64::from(self.settings.burst),
            refreshed: now,
        });
        bucket.refill(now, &self.settings);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateLimitDecision::Allow
        } else {
            RateLimitDecision::Limited
        }
    }
}
