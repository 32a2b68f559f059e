// crates/snare-config/src/config.rs
// ============================================================================
// Module: Snare Configuration
// Description: Configuration schema, loading, and validation.
// Purpose: Wire endpoints, thresholds, and auth material into the services.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! The configuration schema covers every injected dependency: object store,
//! topic bus, inspector URL for rule pushes, sandbox resource limits, and the
//! detection thresholds. Parsing rejects unknown fields and oversized files;
//! `validate` rejects out-of-range thresholds and empty endpoints. Secrets
//! (API tokens) come from the environment, never the file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "snare.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SNARE_CONFIG";
/// Environment variable overriding the object store endpoint.
pub const OBJECT_STORE_ENDPOINT_ENV_VAR: &str = "SNARE_OBJECT_STORE_ENDPOINT";
/// Environment variable overriding the bus endpoint.
pub const BUS_ENDPOINT_ENV_VAR: &str = "SNARE_BUS_ENDPOINT";
/// Environment variable overriding the inspector URL.
pub const INSPECTOR_URL_ENV_VAR: &str = "SNARE_INSPECTOR_URL";
/// Environment variable carrying the privileged API token.
pub const API_TOKEN_ENV_VAR: &str = "SNARE_API_TOKEN";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum number of auth tokens.
const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of an auth token.
const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Default session window capacity.
const DEFAULT_SESSION_WINDOW_CAP: usize = 20;
/// Default auto-apply confidence threshold.
const DEFAULT_AUTO_APPLY_THRESHOLD: f64 = 0.90;
/// Default review confidence threshold.
const DEFAULT_REVIEW_THRESHOLD: f64 = 0.70;
/// Default POI anomaly threshold.
const DEFAULT_POI_THRESHOLD: f64 = 0.75;
/// Default behavioral-anomaly tag threshold.
const DEFAULT_BEHAVIORAL_TAG_THRESHOLD: f64 = 0.7;
/// Default pin duration in hours.
const DEFAULT_PIN_DURATION_HOURS: f64 = 24.0;
/// Default sandbox wall-clock timeout in seconds.
const DEFAULT_SANDBOX_TIMEOUT_SECS: u64 = 300;
/// Default sandbox memory limit in bytes (512 MiB).
const DEFAULT_SANDBOX_MEMORY_BYTES: i64 = 512 * 1024 * 1024;
/// Default sandbox CPU quota against a 100ms period (0.5 CPU).
const DEFAULT_SANDBOX_CPU_QUOTA: i64 = 50_000;
/// Default maximum request body size accepted by the services.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default maximum inflight requests per service.
const DEFAULT_MAX_INFLIGHT: usize = 256;
/// Default simulation worker count.
const DEFAULT_SIMULATION_WORKERS: usize = 2;
/// Default evidence bucket name.
const DEFAULT_EVIDENCE_BUCKET: &str = "decoy-evidence";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file exceeds the size limit.
    #[error("config file exceeds {MAX_CONFIG_FILE_SIZE} bytes")]
    TooLarge,
    /// Config file failed to parse.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config failed validation.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// HTTP server settings shared by the three services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Inspector service bind address.
    #[serde(default = "default_inspector_bind")]
    pub inspector_bind: String,
    /// Router service bind address.
    #[serde(default = "default_router_bind")]
    pub router_bind: String,
    /// Analysis service bind address.
    #[serde(default = "default_analysis_bind")]
    pub analysis_bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Maximum inflight requests per service.
    #[serde(default = "default_max_inflight")]
    pub max_inflight: usize,
    /// Static bearer tokens accepted on privileged endpoints.
    #[serde(default)]
    pub auth_tokens: Vec<String>,
}

/// Detection and policy thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Confidence at or above which rules are auto-applied.
    #[serde(default = "default_auto_apply")]
    pub auto_apply: f64,
    /// Confidence at or above which rules go to review.
    #[serde(default = "default_review")]
    pub review: f64,
    /// Anomaly score at or above which a request is anomalous.
    #[serde(default = "default_poi")]
    pub poi: f64,
    /// Behavioral score above which the behavioral-anomaly tag is added.
    #[serde(default = "default_behavioral_tag")]
    pub behavioral_tag: f64,
    /// Default pin duration in hours.
    #[serde(default = "default_pin_duration_hours")]
    pub pin_duration_hours: f64,
    /// Session window capacity per session.
    #[serde(default = "default_session_window_cap")]
    pub session_window_cap: usize,
}

/// Object store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStoreConfig {
    /// Optional custom endpoint URL (MinIO-compatible stores).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Evidence bucket name.
    #[serde(default = "default_evidence_bucket")]
    pub bucket: String,
    /// Use path-style addressing.
    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

/// Topic bus connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Broker endpoint; empty selects the in-process bus.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Client identifier presented to the broker.
    #[serde(default = "default_bus_client_id")]
    pub client_id: String,
}

/// Inspector endpoint used by the policy orchestrator for rule pushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectorConfig {
    /// Base URL of the inspector service.
    #[serde(default = "default_inspector_url")]
    pub url: String,
    /// Rule push timeout in seconds.
    #[serde(default = "default_rule_push_timeout")]
    pub push_timeout_secs: u64,
}

/// Sandbox provisioning limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Container image for the shadow application.
    #[serde(default = "default_sandbox_image")]
    pub image: String,
    /// Memory limit in bytes.
    #[serde(default = "default_sandbox_memory")]
    pub memory_bytes: i64,
    /// CPU quota against a 100ms period.
    #[serde(default = "default_sandbox_cpu_quota")]
    pub cpu_quota: i64,
    /// Wall-clock timeout per detonation in seconds.
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_secs: u64,
    /// Number of simulation workers.
    #[serde(default = "default_simulation_workers")]
    pub workers: usize,
}

/// Backend URLs handed out by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Production backend URL.
    #[serde(default = "default_production_url")]
    pub production_url: String,
    /// Decoy backend URL.
    #[serde(default = "default_decoy_url")]
    pub decoy_url: String,
}

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Root Snare configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnareConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Detection thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Object store settings.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
    /// Topic bus settings.
    #[serde(default)]
    pub bus: BusConfig,
    /// Inspector push settings.
    #[serde(default)]
    pub inspector: InspectorConfig,
    /// Sandbox settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// Routing backends.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl SnareConfig {
    /// Loads configuration from an explicit path, the `SNARE_CONFIG`
    /// environment variable, or `snare.toml` in the working directory, then
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved: PathBuf = match path {
            Some(path) => path.to_path_buf(),
            None => env::var(CONFIG_ENV_VAR)
                .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from),
        };
        let mut config = if resolved.exists() {
            let raw = fs::read_to_string(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            if raw.len() > MAX_CONFIG_FILE_SIZE {
                return Err(ConfigError::TooLarge);
            }
            toml::from_str::<Self>(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides for endpoints.
    fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = env::var(OBJECT_STORE_ENDPOINT_ENV_VAR) {
            if !endpoint.is_empty() {
                self.object_store.endpoint = Some(endpoint);
            }
        }
        if let Ok(endpoint) = env::var(BUS_ENDPOINT_ENV_VAR) {
            if !endpoint.is_empty() {
                self.bus.endpoint = Some(endpoint);
            }
        }
        if let Ok(url) = env::var(INSPECTOR_URL_ENV_VAR) {
            if !url.is_empty() {
                self.inspector.url = url;
            }
        }
        if let Ok(token) = env::var(API_TOKEN_ENV_VAR) {
            if !token.is_empty() && !self.server.auth_tokens.contains(&token) {
                self.server.auth_tokens.push(token);
            }
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for fraction in [
            ("thresholds.auto_apply", self.thresholds.auto_apply),
            ("thresholds.review", self.thresholds.review),
            ("thresholds.poi", self.thresholds.poi),
            ("thresholds.behavioral_tag", self.thresholds.behavioral_tag),
        ] {
            if !(0.0 ..= 1.0).contains(&fraction.1) {
                return Err(ConfigError::Invalid(format!("{} outside [0, 1]", fraction.0)));
            }
        }
        if self.thresholds.review > self.thresholds.auto_apply {
            return Err(ConfigError::Invalid(
                "thresholds.review must not exceed thresholds.auto_apply".to_string(),
            ));
        }
        if self.thresholds.pin_duration_hours <= 0.0 {
            return Err(ConfigError::Invalid(
                "thresholds.pin_duration_hours must be positive".to_string(),
            ));
        }
        if self.thresholds.session_window_cap == 0 {
            return Err(ConfigError::Invalid(
                "thresholds.session_window_cap must be positive".to_string(),
            ));
        }
        if self.server.auth_tokens.len() > MAX_AUTH_TOKENS {
            return Err(ConfigError::Invalid(format!(
                "server.auth_tokens exceeds {MAX_AUTH_TOKENS} entries"
            )));
        }
        for token in &self.server.auth_tokens {
            if token.is_empty() || token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid(
                    "server.auth_tokens entries must be 1-256 bytes".to_string(),
                ));
            }
        }
        if self.object_store.bucket.is_empty() {
            return Err(ConfigError::Invalid("object_store.bucket must be set".to_string()));
        }
        if self.inspector.url.is_empty() {
            return Err(ConfigError::Invalid("inspector.url must be set".to_string()));
        }
        if self.sandbox.timeout_secs == 0 {
            return Err(ConfigError::Invalid("sandbox.timeout_secs must be positive".to_string()));
        }
        if self.sandbox.workers == 0 {
            return Err(ConfigError::Invalid("sandbox.workers must be positive".to_string()));
        }
        if self.sandbox.memory_bytes <= 0 || self.sandbox.cpu_quota <= 0 {
            return Err(ConfigError::Invalid(
                "sandbox.memory_bytes and sandbox.cpu_quota must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SnareConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            thresholds: ThresholdConfig::default(),
            object_store: ObjectStoreConfig::default(),
            bus: BusConfig::default(),
            inspector: InspectorConfig::default(),
            sandbox: SandboxConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            inspector_bind: default_inspector_bind(),
            router_bind: default_router_bind(),
            analysis_bind: default_analysis_bind(),
            max_body_bytes: default_max_body_bytes(),
            max_inflight: default_max_inflight(),
            auth_tokens: Vec::new(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            auto_apply: default_auto_apply(),
            review: default_review(),
            poi: default_poi(),
            behavioral_tag: default_behavioral_tag(),
            pin_duration_hours: default_pin_duration_hours(),
            session_window_cap: default_session_window_cap(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            bucket: default_evidence_bucket(),
            force_path_style: true,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            client_id: default_bus_client_id(),
        }
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            url: default_inspector_url(),
            push_timeout_secs: default_rule_push_timeout(),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: default_sandbox_image(),
            memory_bytes: default_sandbox_memory(),
            cpu_quota: default_sandbox_cpu_quota(),
            timeout_secs: default_sandbox_timeout(),
            workers: default_simulation_workers(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            production_url: default_production_url(),
            decoy_url: default_decoy_url(),
        }
    }
}

// ============================================================================
// SECTION: Serde Defaults
// ============================================================================

/// Default inspector bind address.
fn default_inspector_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// Default router bind address.
fn default_router_bind() -> String {
    "127.0.0.1:8001".to_string()
}

/// Default analysis bind address.
fn default_analysis_bind() -> String {
    "127.0.0.1:8003".to_string()
}

/// Default maximum body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default inflight request cap.
const fn default_max_inflight() -> usize {
    DEFAULT_MAX_INFLIGHT
}

/// Default auto-apply threshold.
const fn default_auto_apply() -> f64 {
    DEFAULT_AUTO_APPLY_THRESHOLD
}

/// Default review threshold.
const fn default_review() -> f64 {
    DEFAULT_REVIEW_THRESHOLD
}

/// Default POI threshold.
const fn default_poi() -> f64 {
    DEFAULT_POI_THRESHOLD
}

/// Default behavioral tag threshold.
const fn default_behavioral_tag() -> f64 {
    DEFAULT_BEHAVIORAL_TAG_THRESHOLD
}

/// Default pin duration in hours.
const fn default_pin_duration_hours() -> f64 {
    DEFAULT_PIN_DURATION_HOURS
}

/// Default session window capacity.
const fn default_session_window_cap() -> usize {
    DEFAULT_SESSION_WINDOW_CAP
}

/// Default evidence bucket name.
fn default_evidence_bucket() -> String {
    DEFAULT_EVIDENCE_BUCKET.to_string()
}

/// Default `true` for serde.
const fn default_true() -> bool {
    true
}

/// Default bus client identifier.
fn default_bus_client_id() -> String {
    "snare".to_string()
}

/// Default inspector URL.
fn default_inspector_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

/// Default rule push timeout in seconds.
const fn default_rule_push_timeout() -> u64 {
    10
}

/// Default sandbox image.
fn default_sandbox_image() -> String {
    "snare-shadow-app:latest".to_string()
}

/// Default sandbox memory limit.
const fn default_sandbox_memory() -> i64 {
    DEFAULT_SANDBOX_MEMORY_BYTES
}

/// Default sandbox CPU quota.
const fn default_sandbox_cpu_quota() -> i64 {
    DEFAULT_SANDBOX_CPU_QUOTA
}

/// Default sandbox timeout.
const fn default_sandbox_timeout() -> u64 {
    DEFAULT_SANDBOX_TIMEOUT_SECS
}

/// Default simulation worker count.
const fn default_simulation_workers() -> usize {
    DEFAULT_SIMULATION_WORKERS
}

/// Default production backend URL.
fn default_production_url() -> String {
    "http://production-backend:8080".to_string()
}

/// Default decoy backend URL.
fn default_decoy_url() -> String {
    "http://decoy:8080".to_string()
}
