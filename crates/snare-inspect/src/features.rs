// crates/snare-inspect/src/features.rs
// ============================================================================
// Module: Snare Feature Extraction
// Description: Deterministic numeric features for anomaly scoring.
// Purpose: Map a request to exactly 102 named features across six families.
// Dependencies: snare-core, regex
// ============================================================================

//! ## Overview
//! Feature extraction is a pure function of the request: identical inputs
//! yield identical vectors on any host. The 102 features fall into six
//! families: basic shape (10), content character ratios (20), attack-pattern
//! counts (25), entropy and randomness (15), behavioral context from
//! caller-supplied metadata (20), and header analysis (12). Feature names
//! are frozen in sorted order; a missing feature reads as 0.0.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use snare_core::RequestEnvelope;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exact number of features produced per request.
pub const FEATURE_COUNT: usize = 102;

/// SQL keywords counted in uppercase match text.
const SQL_KEYWORDS: &[&str] = &[
    "SELECT",
    "UNION",
    "INSERT",
    "UPDATE",
    "DELETE",
    "DROP",
    "CREATE",
    "ALTER",
    "EXEC",
    "EXECUTE",
    "DECLARE",
    "CAST",
    "CONVERT",
    "FROM",
    "WHERE",
    " OR ",
    " AND ",
    " LIKE ",
    " HAVING ",
    " INFORMATION_SCHEMA",
    "SLEEP",
    "LOAD_FILE",
    "BENCHMARK",
];

/// Cross-site scripting fragments counted in lowercase match text.
const XSS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "onerror=",
    "onload=",
    "onclick=",
    "<iframe",
    "<object",
    "<embed",
    "alert(",
    "eval(",
];

/// Command-injection fragments counted in lowercase match text.
const COMMAND_PATTERNS: &[&str] = &[
    "bash", "sh", "cmd", "powershell", "wget", "curl", "nc", "netcat", "/bin/", "&&", "||", ";",
    "|",
];

/// Path traversal fragments counted in lowercase match text.
const PATH_TRAVERSAL_PATTERNS: &[&str] = &["../", "..\\", "%2e%2e", "%252e%252e"];

/// Known scanner fingerprints in user agents.
const SCANNER_SIGNATURES: &[&str] = &["nikto", "sqlmap", "nmap", "masscan"];

/// Word boundary pattern used for word-length features.
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time literal")]
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Alphanumeric run pattern for sequence features.
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time literal")]
static ALPHANUM_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+").unwrap());

/// Digit run pattern for sequence features.
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time literal")]
static DIGIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Long hex string pattern (16+ hex characters).
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time literal")]
static LONG_HEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9a-fA-F]{16,}").unwrap());

/// Long base64 string pattern (20+ base64 characters).
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time literal")]
static LONG_BASE64_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{20,}={0,2}").unwrap());

// ============================================================================
// SECTION: Feature Set
// ============================================================================

/// Named feature values for one request.
///
/// # Invariants
/// - Iteration order is the frozen sorted name order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSet {
    /// Feature values keyed by name.
    values: BTreeMap<&'static str, f64>,
}

impl FeatureSet {
    /// Returns the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no features are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a named feature value, defaulting to 0.0 when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Returns the values in frozen sorted-name order.
    #[must_use]
    pub fn to_vector(&self) -> Vec<f64> {
        self.values.values().copied().collect()
    }

    /// Returns the sorted feature names.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.values.keys().copied().collect()
    }

    /// Inserts one feature value.
    fn insert(&mut self, name: &'static str, value: f64) {
        self.values.insert(name, value);
    }
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts all 102 features from a request.
#[must_use]
pub fn extract_features(request: &RequestEnvelope) -> FeatureSet {
    let mut features = FeatureSet::default();
    let combined = format!("{} {}", request.url, request.body);
    extract_basic(request, &mut features);
    extract_content(request, &combined, &mut features);
    extract_patterns(&combined, &mut features);
    extract_entropy(request, &mut features);
    extract_behavioral(request, &mut features);
    extract_headers(request, &mut features);
    features
}

/// Basic request shape (10 features).
fn extract_basic(request: &RequestEnvelope, out: &mut FeatureSet) {
    out.insert("request_length", request.body.len() as f64);
    out.insert("url_length", request.url.len() as f64);
    out.insert("header_count", request.headers.len() as f64);
    out.insert("param_count", request.query_params.len() as f64);
    out.insert("method_is_post", flag(request.method == "POST"));
    out.insert("method_is_get", flag(request.method == "GET"));
    out.insert("method_is_put", flag(request.method == "PUT"));
    out.insert("method_is_delete", flag(request.method == "DELETE"));
    out.insert("has_body", flag(!request.body.is_empty()));
    out.insert("has_query_params", flag(!request.query_params.is_empty()));
}

/// Content character ratios and shape (20 features).
fn extract_content(request: &RequestEnvelope, combined: &str, out: &mut FeatureSet) {
    out.insert("digit_ratio", char_ratio(combined, |c| c.is_ascii_digit()));
    out.insert("alpha_ratio", char_ratio(combined, char::is_alphabetic));
    out.insert("special_char_ratio", char_ratio(combined, |c| {
        !c.is_alphanumeric() && !c.is_whitespace()
    }));
    out.insert("uppercase_ratio", char_ratio(combined, char::is_uppercase));
    out.insert("lowercase_ratio", char_ratio(combined, char::is_lowercase));
    out.insert("space_ratio", char_ratio(combined, char::is_whitespace));
    out.insert("null_byte_count", count_char(combined, '\0'));
    out.insert("newline_count", count_char(combined, '\n'));
    out.insert("url_depth", count_char(&request.url, '/'));
    out.insert("url_params_length", request.query_params.len() as f64);
    let body_lines = if request.body.is_empty() {
        0.0
    } else {
        count_char(&request.body, '\n') + 1.0
    };
    out.insert("body_lines", body_lines);
    out.insert("avg_word_length", avg_word_length(combined));
    out.insert("max_word_length", max_word_length(combined));
    out.insert("unique_char_count", combined.chars().collect::<std::collections::BTreeSet<_>>().len() as f64);
    out.insert("repeated_char_ratio", repeated_char_ratio(combined));
    out.insert("hex_ratio", char_ratio(combined, |c| c.is_ascii_hexdigit()));
    out.insert("base64_ratio", char_ratio(combined, |c| {
        c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
    }));
    out.insert("url_encoded_ratio", char_ratio(combined, |c| c == '%'));
    out.insert(
        "json_like",
        flag(request.body.contains('{') && request.body.contains('}')),
    );
    out.insert(
        "xml_like",
        flag(request.body.contains('<') && request.body.contains('>')),
    );
}

/// Attack pattern counts (25 features).
fn extract_patterns(combined: &str, out: &mut FeatureSet) {
    let upper = combined.to_uppercase();
    let lower = combined.to_lowercase();
    out.insert("sql_keyword_count", count_patterns(&upper, SQL_KEYWORDS));
    out.insert("xss_pattern_count", count_patterns(&lower, XSS_PATTERNS));
    out.insert("command_pattern_count", count_patterns(&lower, COMMAND_PATTERNS));
    out.insert("path_traversal_count", count_patterns(&lower, PATH_TRAVERSAL_PATTERNS));
    out.insert("has_union", flag(upper.contains("UNION")));
    out.insert("has_select", flag(upper.contains("SELECT")));
    out.insert("has_script_tag", flag(lower.contains("<script")));
    out.insert("has_iframe", flag(lower.contains("<iframe")));
    out.insert("has_javascript", flag(lower.contains("javascript:")));
    out.insert("has_eval", flag(lower.contains("eval(")));
    out.insert("has_exec", flag(lower.contains("exec")));
    out.insert(
        "sql_comment_count",
        count_substring(combined, "--") + count_substring(combined, "/*"),
    );
    out.insert("quote_count", count_char(combined, '\'') + count_char(combined, '"'));
    out.insert("semicolon_count", count_char(combined, ';'));
    out.insert("equals_count", count_char(combined, '='));
    out.insert("angle_bracket_count", count_char(combined, '<') + count_char(combined, '>'));
    out.insert("parenthesis_count", count_char(combined, '(') + count_char(combined, ')'));
    out.insert("pipe_count", count_char(combined, '|'));
    out.insert("ampersand_count", count_char(combined, '&'));
    out.insert("percent_count", count_char(combined, '%'));
    out.insert("dollar_count", count_char(combined, '$'));
    out.insert("backslash_count", count_char(combined, '\\'));
    out.insert("dot_dot_slash", count_substring(combined, "../"));
    out.insert("double_encoding", flag(combined.contains("%25")));
    out.insert(
        "ldap_injection",
        flag(["*(", "*)", "(|"].iter().any(|p| combined.contains(p))),
    );
}

/// Entropy and randomness (15 features).
fn extract_entropy(request: &RequestEnvelope, out: &mut FeatureSet) {
    let url = request.url.as_str();
    let body = request.body.as_str();
    let joined = format!("{url}{body}");
    out.insert("entropy_url", shannon_entropy(url));
    out.insert("entropy_body", shannon_entropy(body));
    out.insert("entropy_combined", shannon_entropy(&joined));
    out.insert("url_entropy_per_char", shannon_entropy(url) / url.len().max(1) as f64);
    out.insert("body_entropy_per_char", shannon_entropy(body) / body.len().max(1) as f64);
    out.insert("url_randomness", randomness_score(url));
    out.insert("body_randomness", randomness_score(body));
    out.insert("longest_alphanum_sequence", longest_match_len(&ALPHANUM_PATTERN, &joined));
    out.insert("longest_repeated_char", longest_repeated_char(&joined));
    out.insert("consonant_ratio", char_ratio(&joined, is_consonant));
    out.insert("vowel_ratio", char_ratio(&joined, is_vowel));
    out.insert("digit_sequence_max", longest_match_len(&DIGIT_PATTERN, &joined));
    out.insert("has_long_hex_string", flag(LONG_HEX_PATTERN.is_match(&joined)));
    out.insert("has_long_base64_string", flag(LONG_BASE64_PATTERN.is_match(&joined)));
    out.insert("compression_ratio", compression_ratio(&joined));
}

/// Behavioral context from caller-supplied metadata (20 features).
fn extract_behavioral(request: &RequestEnvelope, out: &mut FeatureSet) {
    let meta = |key: &str, default: f64| request.metadata.get(key).copied().unwrap_or(default);
    out.insert("requests_per_second", meta("req_per_sec", 0.0));
    out.insert("requests_in_session", meta("req_count", 1.0));
    out.insert("unique_paths_visited", meta("unique_paths", 1.0));
    out.insert("failed_auth_attempts", meta("failed_auth", 0.0));
    out.insert("method_switches", meta("method_switches", 0.0));
    out.insert("user_agent_changes", meta("ua_changes", 0.0));
    out.insert("time_since_last_request", meta("time_since_last", 0.0));
    out.insert("avg_request_size", meta("avg_req_size", request.body.len() as f64));
    out.insert("error_responses", meta("error_count", 0.0));
    out.insert("redirect_count", meta("redirect_count", 0.0));
    out.insert("session_duration", meta("session_duration", 0.0));
    out.insert("path_depth_variance", meta("path_depth_var", 0.0));
    out.insert("suspicious_path_ratio", meta("suspicious_path_ratio", 0.0));
    out.insert("repeated_param_names", meta("repeated_params", 0.0));
    out.insert("http_version_anomaly", meta("http_version_anomaly", 0.0));
    out.insert("referer_anomaly", flag(request.header("Referer").is_none()));
    out.insert("accept_header_missing", flag(request.header("Accept").is_none()));
    let cookie_count = request.header("Cookie").unwrap_or("").split(';').count();
    out.insert("cookie_count", cookie_count as f64);
    out.insert("unusual_port", meta("unusual_port", 0.0));
    out.insert("protocol_violation", meta("protocol_violation", 0.0));
}

/// Header analysis (12 features).
fn extract_headers(request: &RequestEnvelope, out: &mut FeatureSet) {
    let user_agent = request.user_agent();
    let ua_lower = user_agent.to_lowercase();
    let content_type = request.header("Content-Type").unwrap_or("").to_lowercase();
    out.insert("user_agent_length", user_agent.len() as f64);
    out.insert("user_agent_entropy", shannon_entropy(user_agent));
    out.insert("has_user_agent", flag(!user_agent.is_empty()));
    out.insert("user_agent_is_curl", flag(ua_lower.contains("curl")));
    out.insert("user_agent_is_python", flag(ua_lower.contains("python")));
    out.insert(
        "user_agent_is_scanner",
        flag(SCANNER_SIGNATURES.iter().any(|s| ua_lower.contains(s))),
    );
    out.insert("has_x_forwarded_for", flag(request.header("X-Forwarded-For").is_some()));
    out.insert("has_authorization", flag(request.header("Authorization").is_some()));
    out.insert("has_cookie", flag(request.header("Cookie").is_some()));
    out.insert("content_type_json", flag(content_type.contains("application/json")));
    out.insert("content_type_xml", flag(content_type.contains("xml")));
    out.insert(
        "suspicious_content_type",
        flag(content_type.contains("multipart") || content_type.contains("octet-stream")),
    );
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// 1.0 when the condition holds, 0.0 otherwise.
const fn flag(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// Ratio of characters matching a predicate.
fn char_ratio(text: &str, predicate: impl Fn(char) -> bool) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let matched = text.chars().filter(|c| predicate(*c)).count();
    matched as f64 / total as f64
}

/// Occurrences of a single character.
fn count_char(text: &str, needle: char) -> f64 {
    text.chars().filter(|c| *c == needle).count() as f64
}

/// Non-overlapping occurrences of a substring.
fn count_substring(text: &str, needle: &str) -> f64 {
    if needle.is_empty() {
        return 0.0;
    }
    text.matches(needle).count() as f64
}

/// Total occurrences across a pattern list.
fn count_patterns(text: &str, patterns: &[&str]) -> f64 {
    patterns.iter().map(|p| count_substring(text, p)).sum()
}

/// Average regex word length.
fn avg_word_length(text: &str) -> f64 {
    let mut total = 0usize;
    let mut count = 0usize;
    for word in WORD_PATTERN.find_iter(text) {
        total += word.as_str().len();
        count += 1;
    }
    if count == 0 { 0.0 } else { total as f64 / count as f64 }
}

/// Longest regex word length.
fn max_word_length(text: &str) -> f64 {
    WORD_PATTERN.find_iter(text).map(|word| word.as_str().len()).max().unwrap_or(0) as f64
}

/// Ratio of adjacent repeated characters.
fn repeated_char_ratio(text: &str) -> f64 {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return 0.0;
    }
    let repeated = chars.windows(2).filter(|pair| pair[0] == pair[1]).count();
    repeated as f64 / chars.len() as f64
}

/// Shannon entropy over characters in bits.
fn shannon_entropy(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    let length = text.chars().count() as f64;
    counts
        .values()
        .map(|count| {
            let probability = *count as f64 / length;
            -probability * probability.log2()
        })
        .sum()
}

/// Randomness score in `[0, 1]` from vowel-ratio deviation.
fn randomness_score(text: &str) -> f64 {
    if text.chars().count() < 4 {
        return 0.0;
    }
    let vowels = text.chars().filter(|c| is_vowel(*c)).count();
    let consonants = text.chars().filter(|c| is_consonant(*c)).count();
    if vowels + consonants == 0 {
        return 1.0;
    }
    let vowel_ratio = vowels as f64 / (vowels + consonants) as f64;
    let deviation = (vowel_ratio - 0.35).abs();
    (deviation * 3.0).min(1.0)
}

/// Longest match length for a run pattern.
fn longest_match_len(pattern: &Regex, text: &str) -> f64 {
    pattern.find_iter(text).map(|m| m.as_str().len()).max().unwrap_or(0) as f64
}

/// Longest run of one repeated character.
fn longest_repeated_char(text: &str) -> f64 {
    let mut max_len = 0usize;
    let mut current_len = 0usize;
    let mut previous: Option<char> = None;
    for c in text.chars() {
        if previous == Some(c) {
            current_len += 1;
        } else {
            current_len = 1;
            previous = Some(c);
        }
        max_len = max_len.max(current_len);
    }
    max_len as f64
}

/// ASCII vowel test.
const fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'A' | 'E' | 'I' | 'O' | 'U')
}

/// ASCII consonant test.
const fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !is_vowel(c)
}

/// Compressibility estimate in `[0, 1]` (proxy for randomness).
///
/// A memoryless source compresses to roughly `entropy / 8` of its size, so
/// the per-character entropy stands in for a real compressor here.
fn compression_ratio(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    (shannon_entropy(text) / 8.0).clamp(0.0, 1.0)
}
