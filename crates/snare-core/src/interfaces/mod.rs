// crates/snare-core/src/interfaces/mod.rs
// ============================================================================
// Module: Snare Interfaces
// Description: Backend-agnostic interfaces for stores, blobs, bus, and audit.
// Purpose: Define the contract surfaces Snare services are wired through.
// Dependencies: crate::core, async-trait, tokio
// ============================================================================

//! ## Overview
//! Interfaces define how Snare services integrate with backing state without
//! embedding backend specifics: rule, pin, profile, and simulation stores are
//! narrow synchronous traits whose implementations may be in-memory or a KV
//! store; the blob store and topic bus are asynchronous because they cross
//! the network. Implementations must fail closed on invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::Receiver;

use crate::core::identifiers::Fingerprint;
use crate::core::identifiers::JobId;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::SessionId;
use crate::core::pin::Pin;
use crate::core::profile::AttackerProfile;
use crate::core::rule::Rule;
use crate::core::time::Timestamp;
use crate::core::verdict::SimulationRecord;

// ============================================================================
// SECTION: Rule Store
// ============================================================================

/// Rule store errors.
#[derive(Debug, Error)]
pub enum RuleStoreError {
    /// A rule with the same identifier already exists.
    #[error("rule already exists: {0}")]
    Duplicate(String),
    /// The requested rule does not exist.
    #[error("rule not found: {0}")]
    NotFound(String),
    /// The rule failed validation.
    #[error("rule invalid: {0}")]
    Invalid(String),
    /// Backing storage failed.
    #[error("rule store error: {0}")]
    Store(String),
}

/// Store for inspection rules.
///
/// Rules are created whole and mutated only through `set_enabled` and
/// `set_expiry`; there is no in-place replacement.
pub trait RuleStore: Send + Sync {
    /// Admits a new rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleStoreError::Duplicate`] for an existing identifier and
    /// [`RuleStoreError::Invalid`] when validation fails.
    fn create(&self, rule: Rule) -> Result<(), RuleStoreError>;

    /// Lists all rules, expired rules excluded.
    ///
    /// # Errors
    ///
    /// Returns [`RuleStoreError::Store`] when the backing store fails.
    fn list(&self) -> Result<Vec<Rule>, RuleStoreError>;

    /// Fetches a rule by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RuleStoreError::Store`] when the backing store fails.
    fn get(&self, rule_id: &RuleId) -> Result<Option<Rule>, RuleStoreError>;

    /// Deletes a rule by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RuleStoreError::NotFound`] for unknown identifiers.
    fn delete(&self, rule_id: &RuleId) -> Result<(), RuleStoreError>;

    /// Enables or disables a rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleStoreError::NotFound`] for unknown identifiers.
    fn set_enabled(&self, rule_id: &RuleId, enabled: bool) -> Result<(), RuleStoreError>;

    /// Sets or clears a rule expiry.
    ///
    /// # Errors
    ///
    /// Returns [`RuleStoreError::NotFound`] for unknown identifiers.
    fn set_expiry(
        &self,
        rule_id: &RuleId,
        expires_at: Option<Timestamp>,
    ) -> Result<(), RuleStoreError>;
}

// ============================================================================
// SECTION: Pin Store
// ============================================================================

/// Pin store errors.
#[derive(Debug, Error)]
pub enum PinStoreError {
    /// Backing storage failed.
    #[error("pin store error: {0}")]
    Store(String),
}

/// Store for TTL-bounded session pins.
///
/// Expiry is lazy: reads evict pins whose `pinned_until` has passed, so a
/// missing pin and an expired pin are indistinguishable to callers.
pub trait PinStore: Send + Sync {
    /// Inserts or replaces the pin for its fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError::Store`] when the backing store fails.
    fn put(&self, pin: Pin) -> Result<(), PinStoreError>;

    /// Returns the live pin for a fingerprint, evicting it when expired.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError::Store`] when the backing store fails.
    fn get_live(&self, fingerprint: &Fingerprint, now: Timestamp)
    -> Result<Option<Pin>, PinStoreError>;

    /// Lists all live pins, evicting expired entries.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError::Store`] when the backing store fails.
    fn list_live(&self, now: Timestamp) -> Result<Vec<Pin>, PinStoreError>;

    /// Removes every pin whose session matches; returns the removed count.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError::Store`] when the backing store fails.
    fn remove_session(&self, session_id: &SessionId) -> Result<usize, PinStoreError>;
}

// ============================================================================
// SECTION: Profile Store
// ============================================================================

/// Profile store errors.
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    /// Backing storage failed.
    #[error("profile store error: {0}")]
    Store(String),
}

/// Store for attacker profiles keyed by session.
pub trait ProfileStore: Send + Sync {
    /// Inserts or replaces the profile for its session.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileStoreError::Store`] when the backing store fails.
    fn put(&self, profile: AttackerProfile) -> Result<(), ProfileStoreError>;

    /// Fetches the profile for a session.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileStoreError::Store`] when the backing store fails.
    fn get(&self, session_id: &SessionId) -> Result<Option<AttackerProfile>, ProfileStoreError>;

    /// Lists all stored profiles.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileStoreError::Store`] when the backing store fails.
    fn list(&self) -> Result<Vec<AttackerProfile>, ProfileStoreError>;
}

// ============================================================================
// SECTION: Simulation Store
// ============================================================================

/// Simulation store errors.
#[derive(Debug, Error)]
pub enum SimulationStoreError {
    /// Backing storage failed.
    #[error("simulation store error: {0}")]
    Store(String),
}

/// Store for simulation job records keyed by job identifier.
///
/// The job queue is the single writer; readers observe whole records.
pub trait SimulationStore: Send + Sync {
    /// Inserts or replaces a record.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationStoreError::Store`] when the backing store fails.
    fn put(&self, record: SimulationRecord) -> Result<(), SimulationStoreError>;

    /// Fetches a record by job identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationStoreError::Store`] when the backing store fails.
    fn get(&self, job_id: &JobId) -> Result<Option<SimulationRecord>, SimulationStoreError>;

    /// Lists all records.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationStoreError::Store`] when the backing store fails.
    fn list(&self) -> Result<Vec<SimulationRecord>, SimulationStoreError>;
}

// ============================================================================
// SECTION: Blob Store
// ============================================================================

/// Blob store errors.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// Invalid bucket or object name.
    #[error("blob store invalid input: {0}")]
    Invalid(String),
    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Backend I/O or service failure.
    #[error("blob store backend error: {0}")]
    Backend(String),
}

/// A stored object's name and size as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    /// Object name (bucket-relative key).
    pub name: String,
    /// Object size in bytes.
    pub size: u64,
}

/// Content-addressed object store.
///
/// Buckets are created on demand by `ensure_bucket`; object names are
/// slash-separated keys relative to the bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the bucket when it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Backend`] when the backend call fails.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobStoreError>;

    /// Writes one object.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError`] when validation or the backend fails.
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), BlobStoreError>;

    /// Reads one object.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::NotFound`] for missing objects.
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Lists objects under a prefix, recursively, in ascending name order.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Backend`] when the backend call fails.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<BlobObject>, BlobStoreError>;

    /// Produces a presigned download URL for one object.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError`] when the backend cannot presign.
    async fn presign_get(
        &self,
        bucket: &str,
        name: &str,
        expiry_secs: u64,
    ) -> Result<String, BlobStoreError>;
}

// ============================================================================
// SECTION: Topic Bus
// ============================================================================

/// Topic bus errors.
#[derive(Debug, Error)]
pub enum BusError {
    /// Publish failed.
    #[error("bus publish error: {0}")]
    Publish(String),
    /// Subscribe failed.
    #[error("bus subscribe error: {0}")]
    Subscribe(String),
}

/// Offset reset policy applied when a consumer group first subscribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetReset {
    /// Start from the beginning of the retained log.
    Earliest,
    /// Start from new messages only.
    Latest,
}

/// One delivered bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Partition key.
    pub key: String,
    /// Raw message payload (JSON bytes).
    pub payload: Vec<u8>,
    /// Topic offset of the message.
    pub offset: u64,
}

/// Active subscription delivering messages in publish order per key.
#[derive(Debug)]
pub struct Subscription {
    /// Channel of delivered messages.
    receiver: Receiver<BusMessage>,
}

impl Subscription {
    /// Wraps a delivery channel into a subscription handle.
    #[must_use]
    pub const fn new(receiver: Receiver<BusMessage>) -> Self {
        Self {
            receiver,
        }
    }

    /// Receives the next message, or `None` once the bus shuts down.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }
}

/// Durable ordered topic bus.
///
/// Publication is at-least-once; messages for one key are delivered to a
/// consumer group member in publish order.
#[async_trait]
pub trait TopicBus: Send + Sync {
    /// Publishes a message with a partition key.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Publish`] when the message cannot be accepted.
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Subscribes a consumer group member to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Subscribe`] when the subscription cannot be set up.
    async fn subscribe(
        &self,
        topic: &str,
        group: &str,
        reset: OffsetReset,
    ) -> Result<Subscription, BusError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Structured audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event identifier label.
    pub event: &'static str,
    /// Emitting service label.
    pub service: &'static str,
    /// Event timestamp.
    pub timestamp: Timestamp,
    /// Structured event fields.
    pub fields: serde_json::Value,
}

/// Audit sink for structured service events.
pub trait AuditSink: Send + Sync {
    /// Records one audit event.
    fn record(&self, event: AuditEvent);
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

// ============================================================================
// SECTION: Service Metrics
// ============================================================================

/// Request outcome classification for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

/// Metrics sink for service request counters and latencies.
///
/// Intentionally dependency-light so deployments can plug in Prometheus or
/// OpenTelemetry without redesign.
pub trait ServiceMetrics: Send + Sync {
    /// Records a handled request.
    fn record_request(&self, service: &'static str, endpoint: &str, outcome: MetricOutcome);

    /// Records a request latency observation in milliseconds.
    fn record_latency_ms(&self, service: &'static str, endpoint: &str, latency_ms: u64);
}

/// No-op metrics sink.
pub struct NoopMetrics;

impl ServiceMetrics for NoopMetrics {
    fn record_request(&self, _service: &'static str, _endpoint: &str, _outcome: MetricOutcome) {}

    fn record_latency_ms(&self, _service: &'static str, _endpoint: &str, _latency_ms: u64) {}
}
