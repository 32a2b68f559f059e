// crates/snare-inspect/tests/proptest_features.rs
// ============================================================================
// Module: Feature Extraction Property Tests
// Description: Property tests over arbitrary request content.
// Purpose: Validate count, determinism, and bounds for any input.
// Dependencies: snare-inspect, snare-core, proptest
// ============================================================================
//! ## Overview
//! For any URL, body, and header content: extraction yields exactly 102
//! features, identical inputs yield identical vectors, and ratio features
//! stay inside the unit interval.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use snare_core::RequestEnvelope;
use snare_core::SessionId;
use snare_inspect::FEATURE_COUNT;
use snare_inspect::extract_features;

fn request(method: &str, url: &str, body: &str, user_agent: &str) -> RequestEnvelope {
    RequestEnvelope {
        method: method.to_string(),
        url: url.to_string(),
        headers: BTreeMap::from([("User-Agent".to_string(), user_agent.to_string())]),
        body: body.to_string(),
        query_params: BTreeMap::new(),
        client_ip: "198.51.100.1".to_string(),
        session_id: SessionId::new("sess_prop"),
        metadata: BTreeMap::new(),
    }
}

proptest! {
    /// Any input yields exactly 102 features.
    #[test]
    fn any_input_yields_exact_feature_count(
        method in "(GET|POST|PUT|DELETE|PATCH)",
        url in ".{0,200}",
        body in ".{0,500}",
        ua in ".{0,100}",
    ) {
        let features = extract_features(&request(&method, &url, &body, &ua));
        prop_assert_eq!(features.len(), FEATURE_COUNT);
    }

    /// Identical inputs yield identical vectors.
    #[test]
    fn extraction_is_pure(
        url in ".{0,200}",
        body in ".{0,500}",
    ) {
        let first = extract_features(&request("GET", &url, &body, "ua"));
        let second = extract_features(&request("GET", &url, &body, "ua"));
        prop_assert_eq!(first.to_vector(), second.to_vector());
    }

    /// Ratio features stay inside the unit interval.
    #[test]
    fn ratio_features_are_bounded(
        url in ".{0,200}",
        body in ".{0,500}",
    ) {
        let features = extract_features(&request("GET", &url, &body, "ua"));
        for name in [
            "digit_ratio",
            "alpha_ratio",
            "special_char_ratio",
            "uppercase_ratio",
            "lowercase_ratio",
            "space_ratio",
            "hex_ratio",
            "base64_ratio",
            "url_encoded_ratio",
            "repeated_char_ratio",
            "consonant_ratio",
            "vowel_ratio",
            "compression_ratio",
        ] {
            let value = features.get(name);
            prop_assert!((0.0..=1.0).contains(&value), "{} = {}", name, value);
        }
    }
}
