// crates/snare-config/tests/config.rs
// ============================================================================
// Module: Configuration Tests
// Description: Tests for config defaults, parsing, and validation.
// Purpose: Validate fail-closed parsing and threshold bounds.
// Dependencies: snare-config, tempfile
// ============================================================================
//! ## Overview
//! Defaults must validate; unknown fields and out-of-range thresholds must
//! fail closed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;

use snare_config::ConfigError;
use snare_config::SnareConfig;

/// Writes a temp config file and loads it.
fn load_from(contents: &str) -> Result<SnareConfig, ConfigError> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    SnareConfig::load(Some(file.path()))
}

/// Verifies defaults load and validate when no file exists.
#[test]
fn defaults_validate() {
    let config = SnareConfig::load(Some(std::path::Path::new("/nonexistent/snare.toml"))).unwrap();
    assert_eq!(config.thresholds.auto_apply, 0.90);
    assert_eq!(config.thresholds.review, 0.70);
    assert_eq!(config.thresholds.poi, 0.75);
    assert_eq!(config.thresholds.pin_duration_hours, 24.0);
    assert_eq!(config.thresholds.session_window_cap, 20);
    assert_eq!(config.object_store.bucket, "decoy-evidence");
}

/// Verifies a well-formed file overrides defaults.
#[test]
fn file_overrides_defaults() {
    let config = load_from(
        r#"
[thresholds]
auto_apply = 0.95
review = 0.6
pin_duration_hours = 12.0

[object_store]
bucket = "custom-evidence"
"#,
    )
    .unwrap();
    assert_eq!(config.thresholds.auto_apply, 0.95);
    assert_eq!(config.thresholds.review, 0.6);
    assert_eq!(config.thresholds.pin_duration_hours, 12.0);
    assert_eq!(config.object_store.bucket, "custom-evidence");
}

/// Verifies unknown fields fail parsing.
#[test]
fn unknown_fields_fail_closed() {
    let err = load_from("[thresholds]\nbogus_field = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

/// Verifies out-of-range thresholds fail validation.
#[test]
fn out_of_range_thresholds_fail() {
    let err = load_from("[thresholds]\nauto_apply = 1.5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    let err = load_from("[thresholds]\nreview = 0.95\nauto_apply = 0.9\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    let err = load_from("[thresholds]\npin_duration_hours = 0.0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

/// Verifies sandbox bounds fail closed.
#[test]
fn sandbox_bounds_fail_closed() {
    let err = load_from("[sandbox]\ntimeout_secs = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    let err = load_from("[sandbox]\nworkers = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
