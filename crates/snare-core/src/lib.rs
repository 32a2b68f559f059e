// crates/snare-core/src/lib.rs
// ============================================================================
// Module: Snare Core Library
// Description: Public API surface for the Snare core.
// Purpose: Expose the shared data model, hashing, and backend interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Snare core provides the shared data model for the inspection gateway, the
//! session router, the evidence pipeline, and the analysis engine, together
//! with the backend-agnostic interfaces the services are wired through.
//! Backends (object store, topic bus, rule/pin/profile stores) are injected
//! at startup rather than reached through globals.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::AuditEvent;
pub use interfaces::AuditSink;
pub use interfaces::BlobObject;
pub use interfaces::BlobStore;
pub use interfaces::BlobStoreError;
pub use interfaces::BusError;
pub use interfaces::BusMessage;
pub use interfaces::MetricOutcome;
pub use interfaces::NoopAuditSink;
pub use interfaces::NoopMetrics;
pub use interfaces::OffsetReset;
pub use interfaces::PinStore;
pub use interfaces::PinStoreError;
pub use interfaces::ProfileStore;
pub use interfaces::ProfileStoreError;
pub use interfaces::RuleStore;
pub use interfaces::RuleStoreError;
pub use interfaces::ServiceMetrics;
pub use interfaces::SimulationStore;
pub use interfaces::SimulationStoreError;
pub use interfaces::Subscription;
pub use interfaces::TopicBus;
