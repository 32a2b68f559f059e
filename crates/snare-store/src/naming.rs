// crates/snare-store/src/naming.rs
// ============================================================================
// Module: Snare Object Naming
// Description: Validation of bucket-relative object names.
// Purpose: Reject traversal, absolute paths, and oversized keys before I/O.
// Dependencies: snare-core
// ============================================================================

//! ## Overview
//! Object names are slash-separated keys relative to a bucket. Validation
//! fails closed: empty segments, `.`/`..`, backslashes, absolute paths, and
//! oversized keys are rejected before any backend call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use snare_core::BlobStoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single key segment.
const MAX_SEGMENT_LENGTH: usize = 255;
/// Maximum total key length.
const MAX_KEY_LENGTH: usize = 1024;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a bucket-relative object name.
///
/// # Errors
///
/// Returns [`BlobStoreError::Invalid`] for empty names, absolute paths,
/// traversal segments, backslashes, or oversized keys.
pub fn validate_object_name(name: &str) -> Result<(), BlobStoreError> {
    if name.is_empty() {
        return Err(BlobStoreError::Invalid("object name must be set".to_string()));
    }
    if name.len() > MAX_KEY_LENGTH {
        return Err(BlobStoreError::Invalid("object name exceeds length limit".to_string()));
    }
    if name.contains('\\') {
        return Err(BlobStoreError::Invalid(
            "object name must not contain backslashes".to_string(),
        ));
    }
    if name.starts_with('/') {
        return Err(BlobStoreError::Invalid("object name must be relative".to_string()));
    }
    for segment in name.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(BlobStoreError::Invalid(format!("object name segment invalid: {name}")));
        }
        if segment.len() > MAX_SEGMENT_LENGTH {
            return Err(BlobStoreError::Invalid(
                "object name segment exceeds length limit".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates a bucket name.
///
/// # Errors
///
/// Returns [`BlobStoreError::Invalid`] for empty or slash-bearing names.
pub fn validate_bucket_name(bucket: &str) -> Result<(), BlobStoreError> {
    if bucket.is_empty() {
        return Err(BlobStoreError::Invalid("bucket name must be set".to_string()));
    }
    if bucket.contains(['/', '\\']) {
        return Err(BlobStoreError::Invalid("bucket name must not contain slashes".to_string()));
    }
    Ok(())
}
