// crates/snare-core/tests/hashing.rs
// ============================================================================
// Module: Hashing Tests
// Description: Tests for content hashing and package checksum derivation.
// Purpose: Validate digest determinism and order independence.
// Dependencies: snare-core
// ============================================================================
//! ## Overview
//! Package checksums must be identical for identical inputs on any host and
//! independent of upload order.

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

use snare_core::hashing::hash_bytes;
use snare_core::hashing::hash_hex;
use snare_core::hashing::hex_encode;
use snare_core::hashing::package_checksum;

/// Verifies the SHA-256 digest of a known vector.
#[test]
fn hash_bytes_matches_known_vector() {
    let digest = hash_hex(b"abc");
    assert_eq!(digest, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}

/// Verifies identical inputs always produce identical digests.
#[test]
fn hash_bytes_is_deterministic() {
    assert_eq!(hash_bytes(b"snare"), hash_bytes(b"snare"));
    assert_ne!(hash_bytes(b"snare"), hash_bytes(b"snore"));
}

/// Verifies hex encoding is lowercase and two chars per byte.
#[test]
fn hex_encode_is_lowercase() {
    let encoded = hex_encode(&[0x00, 0xff, 0xa5]);
    assert_eq!(encoded, "00ffa5");
}

/// Verifies the package checksum ignores upload order.
#[test]
fn package_checksum_is_order_independent() {
    let a = ("evt/metadata.json".to_string(), hash_bytes(b"meta"));
    let b = ("evt/session.har".to_string(), hash_bytes(b"har"));
    let c = ("evt/payloads/payload_000.txt".to_string(), hash_bytes(b"payload"));

    let forward = package_checksum(&[a.clone(), b.clone(), c.clone()]);
    let reversed = package_checksum(&[c, b, a]);
    assert_eq!(forward, reversed);
}

/// Verifies the package checksum changes when any object changes.
#[test]
fn package_checksum_tracks_content() {
    let original = package_checksum(&[("x".to_string(), hash_bytes(b"one"))]);
    let modified = package_checksum(&[("x".to_string(), hash_bytes(b"two"))]);
    assert_ne!(original, modified);
}
