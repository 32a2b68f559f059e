// crates/snare-config/src/lib.rs
// ============================================================================
// Module: Snare Config Library
// Description: Configuration loading and validation for Snare services.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits, then
//! overlaid with environment variables for endpoints and secrets. Missing or
//! invalid configuration fails closed. Detection thresholds are configuration
//! here, not constants in the engines, because they are operational tuning
//! knobs rather than learned quantities.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BusConfig;
pub use config::ConfigError;
pub use config::InspectorConfig;
pub use config::ObjectStoreConfig;
pub use config::RoutingConfig;
pub use config::SandboxConfig;
pub use config::ServerConfig;
pub use config::SnareConfig;
pub use config::ThresholdConfig;
