// crates/snare-bus/src/lib.rs
// ============================================================================
// Module: Snare Bus Library
// Description: Topic bus backends for evidence pointers and telemetry.
// Purpose: Provide the in-memory implementation of the TopicBus interface.
// Dependencies: snare-core, tokio
// ============================================================================

//! ## Overview
//! This crate implements the [`snare_core::TopicBus`] interface for a single
//! process: per-topic ordered logs, consumer groups with key-partitioned
//! delivery, and earliest/latest offset reset. A broker-backed implementation
//! plugs in behind the same trait without touching call sites.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod memory;
pub mod topics;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use memory::InMemoryTopicBus;
pub use topics::TOPIC_ALERTS;
pub use topics::TOPIC_EVIDENCE_READY;
pub use topics::TOPIC_TELEMETRY;
