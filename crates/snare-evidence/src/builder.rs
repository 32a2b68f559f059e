// crates/snare-evidence/src/builder.rs
// ============================================================================
// Module: Snare Evidence Builder
// Description: Assembles, uploads, and announces one evidence package.
// Purpose: Turn a captured decoy session into a content-addressed package.
// Dependencies: snare-core, tempfile, md-5, serde_json
// ============================================================================

//! ## Overview
//! One builder instance covers one captured session. Callers add HAR
//! entries, extracted payloads, uploaded-file records, and tags while the
//! session runs, then finalize with `build_and_upload`: the workspace files
//! are written, every file is uploaded to `{bucket}/{event_id}/...`, the
//! package checksum is derived from the per-object checksums in ascending
//! object-name order, and the pointer is published on `evidence-ready`
//! keyed by event id.
//! Invariants:
//! - Any upload failure aborts the build before the pointer is published;
//!   retries reuse the same event id and consumers dedupe on it.
//! - The builder is single-session and not shared across threads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use md5::Digest;
use md5::Md5;
use snare_core::AttackerProfile;
use snare_core::BlobStore;
use snare_core::BlobStoreError;
use snare_core::BusError;
use snare_core::CaptureId;
use snare_core::EventId;
use snare_core::EvidencePointer;
use snare_core::HashDigest;
use snare_core::PayloadArtifact;
use snare_core::PayloadKind;
use snare_core::SessionId;
use snare_core::Timestamp;
use snare_core::TopicBus;
use snare_core::hashing::hash_bytes;
use snare_core::hashing::hash_hex;
use snare_core::hashing::hex_encode;
use snare_core::hashing::package_checksum;
use tempfile::TempDir;
use thiserror::Error;

use crate::har::HarContent;
use crate::har::HarEntry;
use crate::har::HarHeader;
use crate::har::HarLog;
use crate::har::HarPostData;
use crate::har::HarRequest;
use crate::har::HarResponse;
use crate::har::HarTimings;
use crate::package::EvidenceMetadata;
use crate::package::SessionMetadata;
use crate::package::UploadedFileRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Topic the pointer is announced on.
const EVIDENCE_TOPIC: &str = "evidence-ready";
/// HAR file name within the package.
const HAR_FILE: &str = "session.har";
/// Metadata file name within the package.
const METADATA_FILE: &str = "metadata.json";
/// Behavior profile file name within the package.
const BEHAVIOR_FILE: &str = "behavior.json";
/// Payload directory within the package.
const PAYLOAD_DIR: &str = "payloads";
/// Estimated send time recorded in HAR timings.
const ESTIMATED_SEND_MS: f64 = 5.0;
/// Estimated receive time recorded in HAR timings.
const ESTIMATED_RECEIVE_MS: f64 = 5.0;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or uploading a package.
#[derive(Debug, Error)]
pub enum EvidenceBuilderError {
    /// Workspace I/O failed.
    #[error("evidence workspace io error: {0}")]
    Io(String),
    /// Serialization of an artifact failed.
    #[error("evidence serialization error: {0}")]
    Serialization(String),
    /// An upload failed; the pointer was not published.
    #[error("evidence upload failed: {0}")]
    Upload(#[from] BlobStoreError),
    /// Publishing the pointer failed after upload.
    #[error("evidence pointer publish failed: {0}")]
    Publish(#[from] BusError),
}

// ============================================================================
// SECTION: HAR Exchange Input
// ============================================================================

/// One request/response pair handed to the builder.
#[derive(Debug, Clone)]
pub struct HarExchange {
    /// HTTP method.
    pub method: String,
    /// Full URL.
    pub url: String,
    /// Request headers.
    pub request_headers: Vec<(String, String)>,
    /// Request body text.
    pub request_body: String,
    /// Response status code.
    pub response_status: u16,
    /// Response headers.
    pub response_headers: Vec<(String, String)>,
    /// Response body text.
    pub response_body: String,
    /// Request start instant.
    pub started_at: Timestamp,
    /// Total duration in milliseconds.
    pub duration_ms: f64,
}

// ============================================================================
// SECTION: Evidence Builder
// ============================================================================

/// Builder for one session's evidence package.
pub struct EvidenceBuilder {
    /// Event identifier keying the package.
    event_id: EventId,
    /// Capture identifier.
    capture_id: CaptureId,
    /// Session identifier.
    session_id: SessionId,
    /// Attacker IP.
    attacker_ip: String,
    /// Attacker user agent.
    user_agent: String,
    /// MD5-derived sixteen-hex session fingerprint.
    fingerprint: String,
    /// Capture window start.
    session_start: Timestamp,
    /// Collected HAR entries.
    har_entries: Vec<HarEntry>,
    /// Collected payload artifacts.
    payloads: Vec<PayloadArtifact>,
    /// Uploaded file records.
    uploaded_files: Vec<UploadedFileRecord>,
    /// Package tags.
    tags: Vec<String>,
    /// Temporary workspace deleted after upload.
    workspace: TempDir,
}

impl EvidenceBuilder {
    /// Starts a new builder for one captured session.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceBuilderError::Io`] when the workspace cannot be
    /// created.
    pub fn new(
        event_id: EventId,
        session_id: SessionId,
        attacker_ip: &str,
        user_agent: &str,
    ) -> Result<Self, EvidenceBuilderError> {
        let workspace = tempfile::Builder::new()
            .prefix(&format!("evidence_{event_id}_"))
            .tempdir()
            .map_err(|err| EvidenceBuilderError::Io(err.to_string()))?;
        Ok(Self {
            event_id,
            capture_id: CaptureId::generate(),
            session_id,
            attacker_ip: attacker_ip.to_string(),
            user_agent: user_agent.to_string(),
            fingerprint: capture_fingerprint(attacker_ip, user_agent),
            session_start: Timestamp::now(),
            har_entries: Vec::new(),
            payloads: Vec::new(),
            uploaded_files: Vec::new(),
            tags: Vec::new(),
            workspace,
        })
    }

    /// Returns the event id the package is keyed by.
    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Returns the MD5-derived session fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Records one request/response pair.
    pub fn add_har_entry(&mut self, exchange: HarExchange) {
        let response_text = HarLog::inline_response_text(&exchange.response_body);
        let mime_type = exchange
            .response_headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("Content-Type"))
            .map_or_else(|| "application/octet-stream".to_string(), |(_, value)| value.clone());
        let entry = HarEntry {
            started_date_time: exchange.started_at.to_rfc3339(),
            time: exchange.duration_ms,
            request: HarRequest {
                method: exchange.method,
                url: exchange.url,
                http_version: "HTTP/1.1".to_string(),
                headers: to_har_headers(&exchange.request_headers),
                body_size: exchange.request_body.len() as i64,
                post_data: if exchange.request_body.is_empty() {
                    None
                } else {
                    Some(HarPostData {
                        text: exchange.request_body,
                    })
                },
            },
            response: HarResponse {
                status: exchange.response_status,
                status_text: if (200 .. 300).contains(&exchange.response_status) {
                    "OK".to_string()
                } else {
                    "Error".to_string()
                },
                http_version: "HTTP/1.1".to_string(),
                headers: to_har_headers(&exchange.response_headers),
                body_size: exchange.response_body.len() as i64,
                content: HarContent {
                    size: exchange.response_body.len() as i64,
                    mime_type,
                    text: response_text,
                },
            },
            timings: HarTimings {
                send: ESTIMATED_SEND_MS,
                wait: (exchange.duration_ms - ESTIMATED_SEND_MS - ESTIMATED_RECEIVE_MS).max(0.0),
                receive: ESTIMATED_RECEIVE_MS,
            },
        };
        self.har_entries.push(entry);
    }

    /// Records an extracted payload; optionally persists it as a package
    /// file under `payloads/` and returns the artifact id.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceBuilderError::Io`] when the payload file cannot be
    /// written.
    pub fn add_payload(
        &mut self,
        payload_type: PayloadKind,
        payload_value: &str,
        location: &str,
        confidence: f64,
        save_as_file: bool,
    ) -> Result<String, EvidenceBuilderError> {
        let artifact_id = format!("payload_{:03}", self.payloads.len());
        let file_path = if save_as_file {
            let relative = format!("{PAYLOAD_DIR}/{artifact_id}.txt");
            let full = self.workspace.path().join(&relative);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).map_err(|err| EvidenceBuilderError::Io(err.to_string()))?;
            }
            fs::write(&full, payload_value)
                .map_err(|err| EvidenceBuilderError::Io(err.to_string()))?;
            Some(relative)
        } else {
            None
        };
        self.payloads.push(PayloadArtifact {
            artifact_id: artifact_id.clone(),
            payload_type,
            payload_value: payload_value.to_string(),
            location: location.to_string(),
            confidence,
            file_path,
            checksum: hash_bytes(payload_value.as_bytes()),
        });
        Ok(artifact_id)
    }

    /// Records metadata about a file the attacker uploaded.
    pub fn add_uploaded_file(&mut self, filename: &str, contents: &[u8]) {
        self.uploaded_files.push(UploadedFileRecord {
            filename: filename.to_string(),
            size: contents.len(),
            checksum: hash_hex(contents),
        });
    }

    /// Adds a tag once.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|existing| existing == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Finalizes the package: writes the workspace, uploads every file, and
    /// publishes the evidence pointer.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceBuilderError`] when writing, uploading, or
    /// publishing fails. On upload failure partial objects may remain in the
    /// bucket but no pointer is published.
    pub async fn build_and_upload(
        self,
        store: &dyn BlobStore,
        bus: &dyn TopicBus,
        bucket: &str,
        behavior_profile: Option<AttackerProfile>,
    ) -> Result<EvidencePointer, EvidenceBuilderError> {
        let session_end = Timestamp::now();
        let storage_location = format!("s3://{bucket}/{}/", self.event_id);

        let har_log = HarLog {
            entries: self.har_entries.clone(),
            ..HarLog::default()
        };
        let metadata = EvidenceMetadata {
            event_id: self.event_id.clone(),
            capture_id: self.capture_id.clone(),
            created_at: session_end,
            created_by: "decoy".to_string(),
            session_metadata: SessionMetadata {
                session_id: self.session_id.clone(),
                attacker_ip: self.attacker_ip.clone(),
                user_agent: self.user_agent.clone(),
                fingerprint: self.fingerprint.clone(),
                session_start: self.session_start,
                session_end,
                request_count: self.har_entries.len(),
                total_duration_ms: session_end.millis_since(&self.session_start),
                tags: self.tags.clone(),
            },
            behavior_profile: behavior_profile.clone(),
            payloads: self.payloads.clone(),
            uploaded_files: self.uploaded_files.clone(),
            storage_location: storage_location.clone(),
            tags: self.tags.clone(),
        };

        self.write_json(HAR_FILE, &har_log)?;
        self.write_json(METADATA_FILE, &metadata)?;
        if let Some(profile) = &behavior_profile {
            self.write_json(BEHAVIOR_FILE, profile)?;
        }

        store.ensure_bucket(bucket).await?;
        let mut files = Vec::new();
        collect_files(self.workspace.path(), self.workspace.path(), &mut files)
            .map_err(|err| EvidenceBuilderError::Io(err.to_string()))?;
        let mut object_checksums: Vec<(String, HashDigest)> = Vec::with_capacity(files.len());
        for relative in files {
            let bytes = fs::read(self.workspace.path().join(&relative))
                .map_err(|err| EvidenceBuilderError::Io(err.to_string()))?;
            let object_name = format!("{}/{relative}", self.event_id);
            let digest = hash_bytes(&bytes);
            store.put_object(bucket, &object_name, bytes, content_type_for(&relative)).await?;
            object_checksums.push((object_name, digest));
        }
        let checksum = package_checksum(&object_checksums);

        let pointer = EvidencePointer {
            event_id: self.event_id.clone(),
            capture_id: self.capture_id.clone(),
            session_id: self.session_id.clone(),
            attacker_ip: self.attacker_ip.clone(),
            location: storage_location,
            payload_count: self.payloads.len(),
            request_count: self.har_entries.len(),
            checksum,
            tags: self.tags.clone(),
            timestamp: Timestamp::now(),
        };
        let payload = serde_json::to_vec(&pointer)
            .map_err(|err| EvidenceBuilderError::Serialization(err.to_string()))?;
        bus.publish(EVIDENCE_TOPIC, self.event_id.as_str(), payload).await?;
        // Dropping self removes the temporary workspace.
        Ok(pointer)
    }

    /// Writes one JSON artifact into the workspace.
    fn write_json<T: serde::Serialize>(
        &self,
        relative: &str,
        value: &T,
    ) -> Result<(), EvidenceBuilderError> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|err| EvidenceBuilderError::Serialization(err.to_string()))?;
        fs::write(self.workspace.path().join(relative), bytes)
            .map_err(|err| EvidenceBuilderError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Sixteen-hex MD5 fingerprint over `ip:user_agent`.
#[must_use]
pub fn capture_fingerprint(attacker_ip: &str, user_agent: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("{attacker_ip}:{user_agent}").as_bytes());
    let digest = hex_encode(&hasher.finalize());
    digest.chars().take(16).collect()
}

/// Converts header pairs into HAR headers.
fn to_har_headers(headers: &[(String, String)]) -> Vec<HarHeader> {
    headers
        .iter()
        .map(|(name, value)| HarHeader {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Collects workspace files as workspace-relative slash paths.
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let relative: PathBuf =
                path.strip_prefix(root).map_or_else(|_| path.clone(), Path::to_path_buf);
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            out.push(joined);
        }
    }
    out.sort();
    Ok(())
}

/// Content type for a workspace-relative path.
fn content_type_for(relative: &str) -> Option<&'static str> {
    if relative.ends_with(".json") || relative.ends_with(".har") {
        Some("application/json")
    } else if relative.ends_with(".txt") {
        Some("text/plain")
    } else {
        None
    }
}
