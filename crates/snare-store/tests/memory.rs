// crates/snare-store/tests/memory.rs
// ============================================================================
// Module: In-Memory Blob Store Tests
// Description: Tests for the in-memory BlobStore backend.
// Purpose: Validate round-trips, listing order, and name validation.
// Dependencies: snare-store, snare-core
// ============================================================================
//! ## Overview
//! The in-memory backend mirrors the S3 backend contract: prefix listing in
//! ascending name order, `NotFound` for missing objects, and fail-closed
//! object-name validation.

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

use snare_core::BlobStore;
use snare_core::BlobStoreError;
use snare_store::InMemoryBlobStore;
use snare_store::validate_object_name;

/// Verifies put/get round-trips bytes.
#[tokio::test]
async fn put_get_roundtrip() {
    let store = InMemoryBlobStore::new();
    store.ensure_bucket("evidence").await.unwrap();
    store.put_object("evidence", "evt/metadata.json", b"{}".to_vec(), None).await.unwrap();
    let bytes = store.get_object("evidence", "evt/metadata.json").await.unwrap();
    assert_eq!(bytes, b"{}".to_vec());
}

/// Verifies missing objects are NotFound.
#[tokio::test]
async fn missing_object_is_not_found() {
    let store = InMemoryBlobStore::new();
    store.ensure_bucket("evidence").await.unwrap();
    let err = store.get_object("evidence", "missing").await.unwrap_err();
    assert!(matches!(err, BlobStoreError::NotFound(_)));
}

/// Verifies listing is prefix-filtered and name-ordered.
#[tokio::test]
async fn listing_is_prefix_filtered_and_ordered() {
    let store = InMemoryBlobStore::new();
    store.ensure_bucket("evidence").await.unwrap();
    for name in ["evt1/b.txt", "evt1/a.txt", "evt2/c.txt"] {
        store.put_object("evidence", name, b"x".to_vec(), None).await.unwrap();
    }
    let objects = store.list_objects("evidence", "evt1/").await.unwrap();
    let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["evt1/a.txt", "evt1/b.txt"]);
    assert!(objects.iter().all(|o| o.size == 1));
}

/// Verifies hostile object names are rejected before any I/O.
#[tokio::test]
async fn hostile_names_are_rejected() {
    let store = InMemoryBlobStore::new();
    store.ensure_bucket("evidence").await.unwrap();
    for name in ["../escape", "/absolute", "a//b", "a\\b", ""] {
        let result = store.put_object("evidence", name, Vec::new(), None).await;
        assert!(matches!(result, Err(BlobStoreError::Invalid(_))), "accepted {name:?}");
    }
}

/// Verifies the standalone validator agrees with the store.
#[test]
fn validator_accepts_normal_keys() {
    assert!(validate_object_name("evt/payloads/payload_000.txt").is_ok());
    assert!(validate_object_name("metadata.json").is_ok());
    assert!(validate_object_name("./x").is_err());
}

/// Verifies presigned URLs name the object.
#[tokio::test]
async fn presign_names_the_object() {
    let store = InMemoryBlobStore::new();
    store.ensure_bucket("evidence").await.unwrap();
    let url = store.presign_get("evidence", "evt/session.har", 600).await.unwrap();
    assert_eq!(url, "memory://evidence/evt/session.har");
}
