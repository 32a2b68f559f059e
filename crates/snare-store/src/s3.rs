// crates/snare-store/src/s3.rs
// ============================================================================
// Module: Snare S3 Blob Store
// Description: S3-compatible BlobStore backend for evidence packages.
// Purpose: Persist evidence artifacts in durable object storage.
// Dependencies: snare-core, aws-config, aws-sdk-s3
// ============================================================================

//! ## Overview
//! S3-backed implementation of [`BlobStore`]. Custom endpoints with
//! path-style addressing support MinIO-compatible deployments. Buckets are
//! created on demand; `ensure_bucket` treats an already-owned bucket as
//! success. Object names are validated before every call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use snare_core::BlobObject;
use snare_core::BlobStore;
use snare_core::BlobStoreError;

use crate::naming::validate_bucket_name;
use crate::naming::validate_object_name;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Connection settings for the S3 backend.
#[derive(Debug, Clone)]
pub struct S3BlobStoreConfig {
    /// Optional custom endpoint URL (MinIO or other S3-compatible stores).
    pub endpoint: Option<String>,
    /// Optional region override.
    pub region: Option<String>,
    /// Use path-style addressing instead of virtual-hosted buckets.
    pub force_path_style: bool,
}

// ============================================================================
// SECTION: S3 Blob Store
// ============================================================================

/// S3-compatible blob store.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    /// Underlying S3 client.
    client: Client,
}

impl S3BlobStore {
    /// Builds a store from configuration, loading credentials from the
    /// ambient AWS credential chain.
    pub async fn connect(config: &S3BlobStoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = config.endpoint.clone() {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Wraps an existing client (tests against S3-compatible fixtures).
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobStoreError> {
        validate_bucket_name(bucket)?;
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_bucket_already_owned_by_you()
                    || service_err.is_bucket_already_exists()
                {
                    Ok(())
                } else {
                    Err(BlobStoreError::Backend(service_err.to_string()))
                }
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), BlobStoreError> {
        validate_bucket_name(bucket)?;
        validate_object_name(name)?;
        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(name)
            .body(ByteStream::from(bytes));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        request.send().await.map_err(|err| BlobStoreError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BlobStoreError> {
        validate_bucket_name(bucket)?;
        validate_object_name(name)?;
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    BlobStoreError::NotFound(name.to_string())
                } else {
                    BlobStoreError::Backend(service_err.to_string())
                }
            })?;
        let collected = output
            .body
            .collect()
            .await
            .map_err(|err| BlobStoreError::Backend(err.to_string()))?;
        Ok(collected.into_bytes().to_vec())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<BlobObject>, BlobStoreError> {
        validate_bucket_name(bucket)?;
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request =
                self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }
            let page =
                request.send().await.map_err(|err| BlobStoreError::Backend(err.to_string()))?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let size = u64::try_from(object.size().unwrap_or(0)).unwrap_or(0);
                objects.push(BlobObject {
                    name: key.to_string(),
                    size,
                });
            }
            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        name: &str,
        expiry_secs: u64,
    ) -> Result<String, BlobStoreError> {
        validate_bucket_name(bucket)?;
        validate_object_name(name)?;
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expiry_secs))
            .map_err(|err| BlobStoreError::Invalid(err.to_string()))?;
        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(name)
            .presigned(presigning)
            .await
            .map_err(|err| BlobStoreError::Backend(err.to_string()))?;
        Ok(presigned.uri().to_string())
    }
}
