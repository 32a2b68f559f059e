// crates/snare-server/tests/limits.rs
// ============================================================================
// Module: Rate Limiter Tests
// Description: Tests for the per-client token-bucket limiter.
// Purpose: Validate burst absorption, refill, and capacity fail-closed.
// Dependencies: snare-server
// ============================================================================
//! ## Overview
//! A client may spend its burst immediately, is throttled once the bucket is
//! empty, and recovers as tokens refill; distinct clients do not interfere,
//! and an over-capacity limiter fails closed for new clients.

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

use snare_server::RateLimitDecision;
use snare_server::RateLimitSettings;
use snare_server::RateLimiter;

/// Verifies the burst is spent and the next request is limited.
#[test]
fn burst_is_enforced() {
    let limiter = RateLimiter::new(RateLimitSettings {
        burst: 3,
        per_second: 0.001,
        max_entries: 16,
    });
    for _ in 0 .. 3 {
        assert_eq!(limiter.check("203.0.113.1"), RateLimitDecision::Allow);
    }
    assert_eq!(limiter.check("203.0.113.1"), RateLimitDecision::Limited);
}

/// Verifies distinct client IPs hold independent buckets.
#[test]
fn clients_are_independent() {
    let limiter = RateLimiter::new(RateLimitSettings {
        burst: 1,
        per_second: 0.001,
        max_entries: 16,
    });
    assert_eq!(limiter.check("203.0.113.1"), RateLimitDecision::Allow);
    assert_eq!(limiter.check("203.0.113.1"), RateLimitDecision::Limited);
    assert_eq!(limiter.check("203.0.113.2"), RateLimitDecision::Allow);
}

/// Verifies an emptied bucket recovers as tokens refill.
#[test]
fn bucket_refills_over_time() {
    let limiter = RateLimiter::new(RateLimitSettings {
        burst: 1,
        per_second: 50.0,
        max_entries: 16,
    });
    assert_eq!(limiter.check("k"), RateLimitDecision::Allow);
    assert_eq!(limiter.check("k"), RateLimitDecision::Limited);
    // 100ms at 50 tokens/s refills well past one token.
    std::thread::sleep(std::time::Duration::from_millis(100));
    assert_eq!(limiter.check("k"), RateLimitDecision::Allow);
}

/// Verifies fully refilled buckets are reclaimed at the capacity edge.
#[test]
fn refilled_buckets_are_reclaimed() {
    let limiter = RateLimiter::new(RateLimitSettings {
        burst: 1,
        per_second: 1_000.0,
        max_entries: 2,
    });
    assert_eq!(limiter.check("a"), RateLimitDecision::Allow);
    assert_eq!(limiter.check("b"), RateLimitDecision::Allow);
    // Both buckets refill almost immediately at this rate, so a new client
    // reclaims a slot instead of failing.
    std::thread::sleep(std::time::Duration::from_millis(10));
    assert_eq!(limiter.check("c"), RateLimitDecision::Allow);
}

/// Verifies the limiter fails closed for new clients once saturated.
#[test]
fn saturated_limiter_fails_closed() {
    let limiter = RateLimiter::new(RateLimitSettings {
        burst: 5,
        per_second: 0.001,
        max_entries: 2,
    });
    assert_eq!(limiter.check("a"), RateLimitDecision::Allow);
    assert_eq!(limiter.check("b"), RateLimitDecision::Allow);
    // Both tracked buckets have spent a token and refill too slowly to be
    // reclaimed, so a third client is rejected.
    assert_eq!(limiter.check("c"), RateLimitDecision::OverCapacity);
    // Known clients keep their buckets.
    assert_eq!(limiter.check("a"), RateLimitDecision::Allow);
}
