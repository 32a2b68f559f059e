// crates/snare-evidence/src/retriever.rs
// ============================================================================
// Module: Snare Evidence Retriever
// Description: Downloads and validates evidence packages from the store.
// Purpose: Turn an evidence pointer back into parsed session evidence.
// Dependencies: snare-core, url, serde_json
// ============================================================================

//! ## Overview
//! The retriever lists every object under the pointer's package prefix,
//! downloads the package into a per-event workspace, recomputes the package
//! checksum, and parses `metadata.json` and `session.har`. A checksum
//! mismatch marks the evidence invalid but still returns it; the caller
//! decides what to do with tampered packages. Payload artifacts are
//! enumerated from the metadata manifest and the `payloads/` directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use snare_core::BlobStore;
use snare_core::BlobStoreError;
use snare_core::EventId;
use snare_core::EvidencePointer;
use snare_core::HashDigest;
use snare_core::PayloadArtifact;
use snare_core::hashing::hash_bytes;
use snare_core::hashing::package_checksum;
use thiserror::Error;
use url::Url;

use crate::har::HarLog;
use crate::package::EvidenceMetadata;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HAR file name within the package.
const HAR_FILE: &str = "session.har";
/// Metadata file name within the package.
const METADATA_FILE: &str = "metadata.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while retrieving evidence.
#[derive(Debug, Error)]
pub enum RetrieverError {
    /// The pointer location could not be parsed.
    #[error("invalid evidence location: {0}")]
    InvalidLocation(String),
    /// Workspace I/O failed.
    #[error("evidence workspace io error: {0}")]
    Io(String),
    /// A download failed.
    #[error("evidence download failed: {0}")]
    Download(#[from] BlobStoreError),
}

// ============================================================================
// SECTION: Retrieved Evidence
// ============================================================================

/// Parsed evidence returned to the analysis pipeline.
#[derive(Debug)]
pub struct RetrievedEvidence {
    /// Event identifier.
    pub event_id: EventId,
    /// Parsed package metadata, when present and well-formed.
    pub metadata: Option<EvidenceMetadata>,
    /// Parsed HAR log, when present and well-formed.
    pub har_log: Option<HarLog>,
    /// Payload artifacts from the metadata manifest.
    pub payloads: Vec<PayloadArtifact>,
    /// Workspace directory holding the downloaded files.
    pub workspace: PathBuf,
    /// Whether the recomputed checksum matched the pointer's claim.
    pub valid: bool,
    /// Number of downloaded artifacts.
    pub artifact_count: usize,
}

// ============================================================================
// SECTION: Evidence Retriever
// ============================================================================

/// Downloads evidence packages into per-event workspaces.
pub struct EvidenceRetriever<S> {
    /// Blob store holding packages.
    store: S,
    /// Root directory for evidence workspaces.
    workspace_root: PathBuf,
}

impl<S: BlobStore> EvidenceRetriever<S> {
    /// Creates a retriever rooted at the given workspace directory.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieverError::Io`] when the root cannot be created.
    pub fn new(store: S, workspace_root: impl Into<PathBuf>) -> Result<Self, RetrieverError> {
        let workspace_root = workspace_root.into();
        fs::create_dir_all(&workspace_root).map_err(|err| RetrieverError::Io(err.to_string()))?;
        Ok(Self {
            store,
            workspace_root,
        })
    }

    /// Retrieves and validates the package behind a pointer.
    ///
    /// A checksum mismatch is reported through `valid = false` rather than an
    /// error. Workspace contents are removed on failure.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieverError`] when the location is unparseable or a
    /// download fails.
    pub async fn retrieve(
        &self,
        pointer: &EvidencePointer,
    ) -> Result<RetrievedEvidence, RetrieverError> {
        let (bucket, prefix) = parse_location(&pointer.location)?;
        let workspace = self.workspace_root.join(pointer.event_id.as_str());
        fs::create_dir_all(&workspace).map_err(|err| RetrieverError::Io(err.to_string()))?;

        let result = self.download_package(pointer, &bucket, &prefix, &workspace).await;
        if result.is_err() {
            let _ = fs::remove_dir_all(&workspace);
        }
        result
    }

    /// Downloads every package object and parses the artifacts.
    async fn download_package(
        &self,
        pointer: &EvidencePointer,
        bucket: &str,
        prefix: &str,
        workspace: &Path,
    ) -> Result<RetrievedEvidence, RetrieverError> {
        let objects = self.store.list_objects(bucket, prefix).await?;
        let mut checksums: Vec<(String, HashDigest)> = Vec::with_capacity(objects.len());
        for object in &objects {
            let bytes = self.store.get_object(bucket, &object.name).await?;
            checksums.push((object.name.clone(), hash_bytes(&bytes)));
            let relative = object
                .name
                .strip_prefix(&format!("{}/", pointer.event_id))
                .unwrap_or(&object.name);
            let local = workspace.join(relative);
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent).map_err(|err| RetrieverError::Io(err.to_string()))?;
            }
            fs::write(&local, &bytes).map_err(|err| RetrieverError::Io(err.to_string()))?;
        }

        let recomputed = package_checksum(&checksums);
        let valid = recomputed == pointer.checksum;
        if !valid {
            tracing::warn!(
                event_id = %pointer.event_id,
                expected = %pointer.checksum,
                recomputed = %recomputed,
                "evidence package checksum mismatch"
            );
        }

        let metadata: Option<EvidenceMetadata> = read_json(&workspace.join(METADATA_FILE));
        let har_log: Option<HarLog> = read_json(&workspace.join(HAR_FILE));
        let payloads = metadata.as_ref().map(|m| m.payloads.clone()).unwrap_or_default();

        Ok(RetrievedEvidence {
            event_id: pointer.event_id.clone(),
            metadata,
            har_log,
            payloads,
            workspace: workspace.to_path_buf(),
            valid,
            artifact_count: objects.len(),
        })
    }

    /// Removes one evidence workspace.
    pub fn cleanup(&self, workspace: &Path) {
        let _ = fs::remove_dir_all(workspace);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits an `s3://bucket/prefix/` location into bucket and prefix.
fn parse_location(location: &str) -> Result<(String, String), RetrieverError> {
    let url =
        Url::parse(location).map_err(|_| RetrieverError::InvalidLocation(location.to_string()))?;
    let bucket = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| RetrieverError::InvalidLocation(location.to_string()))?
        .to_string();
    let prefix = url.path().trim_start_matches('/').to_string();
    Ok((bucket, prefix))
}

/// Reads and parses one JSON artifact, returning `None` when absent or
/// malformed.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}
