// crates/snare-store/src/memory.rs
// ============================================================================
// Module: Snare In-Memory Blob Store
// Description: In-memory BlobStore for tests and local demos.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: snare-core
// ============================================================================

//! ## Overview
//! In-memory implementation of [`BlobStore`] backed by nested maps. Behavior
//! mirrors the S3 backend closely enough for pipeline tests: listing is
//! prefix-based and name-ordered, missing objects are `NotFound`, and
//! presigned URLs are synthetic `memory://` URIs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use snare_core::BlobObject;
use snare_core::BlobStore;
use snare_core::BlobStoreError;

use crate::naming::validate_bucket_name;
use crate::naming::validate_object_name;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Bucket contents keyed by object name.
type Bucket = BTreeMap<String, Vec<u8>>;

/// In-memory blob store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBlobStore {
    /// Buckets keyed by name, protected by a mutex.
    buckets: Arc<Mutex<BTreeMap<String, Bucket>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored objects across all buckets.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Backend`] when the store mutex is poisoned.
    pub fn object_count(&self) -> Result<usize, BlobStoreError> {
        let guard = self
            .buckets
            .lock()
            .map_err(|_| BlobStoreError::Backend("blob store mutex poisoned".to_string()))?;
        Ok(guard.values().map(BTreeMap::len).sum())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobStoreError> {
        validate_bucket_name(bucket)?;
        self.buckets
            .lock()
            .map_err(|_| BlobStoreError::Backend("blob store mutex poisoned".to_string()))?
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<(), BlobStoreError> {
        validate_bucket_name(bucket)?;
        validate_object_name(name)?;
        self.buckets
            .lock()
            .map_err(|_| BlobStoreError::Backend("blob store mutex poisoned".to_string()))?
            .entry(bucket.to_string())
            .or_default()
            .insert(name.to_string(), bytes);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BlobStoreError> {
        validate_bucket_name(bucket)?;
        validate_object_name(name)?;
        let guard = self
            .buckets
            .lock()
            .map_err(|_| BlobStoreError::Backend("blob store mutex poisoned".to_string()))?;
        guard
            .get(bucket)
            .and_then(|objects| objects.get(name))
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(format!("{bucket}/{name}")))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<BlobObject>, BlobStoreError> {
        validate_bucket_name(bucket)?;
        let guard = self
            .buckets
            .lock()
            .map_err(|_| BlobStoreError::Backend("blob store mutex poisoned".to_string()))?;
        let Some(objects) = guard.get(bucket) else {
            return Ok(Vec::new());
        };
        Ok(objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, bytes)| BlobObject {
                name: name.clone(),
                size: bytes.len() as u64,
            })
            .collect())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        name: &str,
        _expiry_secs: u64,
    ) -> Result<String, BlobStoreError> {
        validate_bucket_name(bucket)?;
        validate_object_name(name)?;
        Ok(format!("memory://{bucket}/{name}"))
    }
}
