// crates/snare-analysis/src/profiler.rs
// ============================================================================
// Module: Snare Behavioral Profiler
// Description: Action classification, TTP mapping, and intent inference.
// Purpose: Build an attacker profile from one captured session.
// Dependencies: snare-core
// ============================================================================

//! ## Overview
//! The profiler classifies each captured request into an action bucket,
//! maps observed attack types and path families to MITRE ATT&CK technique
//! identifiers, infers the dominant intent, and scores sophistication.
//! Profiling is deterministic: re-profiling the same captures yields the
//! same profile. Session clustering groups similar profiles by density over
//! normalized shape vectors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use snare_core::AttackIntent;
use snare_core::AttackerProfile;
use snare_core::PayloadKind;
use snare_core::SessionId;
use snare_core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Clustering radius over normalized shape vectors.
const CLUSTER_EPS: f64 = 0.5;
/// Minimum neighborhood size for a core point.
const CLUSTER_MIN_POINTS: usize = 2;
/// Guard against zero variance during normalization.
const NORM_EPSILON: f64 = 1e-8;

/// Exploit-family actions counted toward the exploitation intent.
const EXPLOIT_ACTIONS: &[&str] =
    &["sql_injection_attempt", "xss_attempt", "command_injection_attempt"];

/// Reconnaissance-family actions counted toward the recon intent.
const RECON_ACTIONS: &[&str] = &["reconnaissance", "user_enumeration", "config_disclosure_attempt"];

/// Scanner fingerprints that mark automated tooling.
const SCANNER_AGENTS: &[&str] = &["sqlmap", "nikto"];

// ============================================================================
// SECTION: Capture Record
// ============================================================================

/// One captured request handed to the profiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Capture instant, when recorded.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    /// Response status, when recorded.
    #[serde(default)]
    pub status: Option<u16>,
    /// Payload classifications attached to the capture.
    #[serde(default)]
    pub payload_types: Vec<PayloadKind>,
    /// User agent presented with the request.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request body, when recorded.
    #[serde(default)]
    pub body: Option<String>,
}

impl CaptureRecord {
    /// Returns the path component of the capture URL.
    #[must_use]
    pub fn path(&self) -> &str {
        let without_query = self.url.split('?').next().unwrap_or("");
        without_query.find("://").map_or(without_query, |scheme_end| {
            let after_scheme = &without_query[scheme_end + 3 ..];
            after_scheme.find('/').map_or("/", |slash| &after_scheme[slash ..])
        })
    }
}

// ============================================================================
// SECTION: Profiler
// ============================================================================

/// Deterministic behavioral profiler.
#[derive(Debug, Default, Clone)]
pub struct BehavioralProfiler;

impl BehavioralProfiler {
    /// Creates a profiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the attacker profile for one session.
    #[must_use]
    pub fn analyze_session(
        &self,
        session_id: &SessionId,
        captures: &[CaptureRecord],
    ) -> AttackerProfile {
        if captures.is_empty() {
            return empty_profile(session_id);
        }
        let actions: Vec<String> =
            captures.iter().map(|c| classify_action(c).to_string()).collect();
        let ttps = extract_ttps(captures);
        let intent = classify_intent(&actions);
        let sophistication = score_sophistication(captures, &actions);
        let unique_endpoints =
            captures.iter().map(|c| c.path().to_string()).collect::<BTreeSet<_>>().len();
        let duration_seconds = session_duration(captures);
        let summary = summarize(&actions, &ttps, intent);
        AttackerProfile {
            session_id: session_id.clone(),
            action_sequence: actions,
            intent,
            sophistication,
            ttps,
            unique_endpoints,
            duration_seconds,
            summary,
            cluster_id: None,
        }
    }

    /// Assigns cluster ids to similar profiles by density over normalized
    /// shape vectors; noise profiles get cluster id -1. Fewer than three
    /// profiles are left unclustered.
    pub fn cluster_sessions(&self, profiles: &mut [AttackerProfile]) {
        if profiles.len() < 3 {
            return;
        }
        let vectors: Vec<Vec<f64>> = profiles
            .iter()
            .map(|p| {
                vec![
                    p.action_sequence.len() as f64,
                    p.sophistication,
                    p.duration_seconds,
                    p.unique_endpoints as f64,
                    p.ttps.len() as f64,
                ]
            })
            .collect();
        let normalized = normalize_columns(&vectors);
        let labels = density_cluster(&normalized, CLUSTER_EPS, CLUSTER_MIN_POINTS);
        for (profile, label) in profiles.iter_mut().zip(labels) {
            profile.cluster_id = Some(label);
        }
    }
}

// ============================================================================
// SECTION: Action Classification
// ============================================================================

/// Classifies one capture into an action bucket.
#[must_use]
pub fn classify_action(capture: &CaptureRecord) -> &'static str {
    if capture.payload_types.contains(&PayloadKind::SqlInjection) {
        return "sql_injection_attempt";
    }
    if capture.payload_types.contains(&PayloadKind::Xss) {
        return "xss_attempt";
    }
    if capture.payload_types.contains(&PayloadKind::CommandInjection) {
        return "command_injection_attempt";
    }
    if capture.payload_types.contains(&PayloadKind::PathTraversal) {
        return "path_traversal_attempt";
    }
    let path = capture.path();
    if path.contains("/users") {
        return "user_enumeration";
    }
    if path.contains("/admin") {
        return "admin_access_attempt";
    }
    if path.contains("/config") || path.contains("/.env") {
        return "config_disclosure_attempt";
    }
    if path.contains("/login") {
        return "authentication_attempt";
    }
    if path.contains("/upload") && capture.method == "POST" {
        return "file_upload_attempt";
    }
    if path.contains("/documents") && path.contains("download") {
        return "data_access_attempt";
    }
    match capture.method.as_str() {
        "GET" => "reconnaissance",
        "POST" => "exploitation_attempt",
        "PUT" | "PATCH" => "modification_attempt",
        "DELETE" => "deletion_attempt",
        _ => "unknown_action",
    }
}

/// Deduplicated, sorted MITRE technique identifiers for the captures.
fn extract_ttps(captures: &[CaptureRecord]) -> Vec<String> {
    let mut ttps: BTreeSet<&'static str> = BTreeSet::new();
    for capture in captures {
        for kind in &capture.payload_types {
            match kind {
                PayloadKind::SqlInjection => {
                    ttps.insert("T1190");
                }
                PayloadKind::Xss => {
                    ttps.insert("T1190");
                    ttps.insert("T1059.007");
                }
                PayloadKind::CommandInjection => {
                    ttps.insert("T1059");
                }
                PayloadKind::PathTraversal => {
                    ttps.insert("T1083");
                }
                PayloadKind::FileUpload => {
                    ttps.insert("T1105");
                }
                PayloadKind::Xxe | PayloadKind::Unknown => {}
            }
        }
        let path = capture.path();
        if path.contains("/admin") || path.contains("/config") {
            ttps.insert("T1083");
        }
        if path.contains("/login") {
            ttps.insert("T1110");
        }
        if path.contains("/upload") {
            ttps.insert("T1105");
        }
    }
    ttps.into_iter().map(str::to_string).collect()
}

/// Infers the dominant intent from the action histogram.
fn classify_intent(actions: &[String]) -> AttackIntent {
    if actions.is_empty() {
        return AttackIntent::Unknown;
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for action in actions {
        *counts.entry(action.as_str()).or_insert(0) += 1;
    }
    let total = actions.len() as f64;
    let count = |name: &str| counts.get(name).copied().unwrap_or(0);
    if count("data_access_attempt") as f64 / total > 0.3 {
        return AttackIntent::DataExfiltration;
    }
    let exploit: usize = EXPLOIT_ACTIONS.iter().map(|a| count(a)).sum();
    if exploit as f64 / total > 0.4 {
        return AttackIntent::Exploitation;
    }
    let recon: usize = RECON_ACTIONS.iter().map(|a| count(a)).sum();
    if recon as f64 / total > 0.5 {
        return AttackIntent::Reconnaissance;
    }
    if count("admin_access_attempt") > 0 {
        return AttackIntent::PrivilegeEscalation;
    }
    AttackIntent::Unknown
}

/// Scores sophistication in `[0, 10]`.
fn score_sophistication(captures: &[CaptureRecord], actions: &[String]) -> f64 {
    let mut score = 0.0f64;

    // Variety of attack categories, half a point each, capped at three.
    let unique_attacks =
        actions.iter().filter(|a| a.contains("attempt")).collect::<BTreeSet<_>>().len();
    score += (unique_attacks as f64 * 0.5).min(3.0);

    // Obfuscation: base64 markers or double URL encoding anywhere.
    let obfuscated = captures.iter().any(|c| {
        let combined =
            format!("{} {}", c.url, c.body.as_deref().unwrap_or("")).to_lowercase();
        combined.contains("base64") || combined.contains("%25")
    });
    if obfuscated {
        score += 2.0;
    }

    // Automated scanners score lower than manual or custom tooling.
    let scanner = captures.iter().any(|c| {
        let ua = c.user_agent.as_deref().unwrap_or("").to_lowercase();
        SCANNER_AGENTS.iter().any(|s| ua.contains(s))
    });
    score += if scanner { 1.0 } else { 2.0 };

    // Request volume: few targeted requests read as deliberate.
    score += if captures.len() < 10 {
        3.0
    } else if captures.len() > 50 {
        1.0
    } else {
        2.0
    };

    score.min(10.0)
}

/// Session duration in seconds from recorded timestamps.
fn session_duration(captures: &[CaptureRecord]) -> f64 {
    let timestamps: Vec<Timestamp> = captures.iter().filter_map(|c| c.timestamp).collect();
    match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(first), Some(last)) if timestamps.len() >= 2 => last.seconds_since(first),
        _ => 0.0,
    }
}

/// Human-readable summary string.
fn summarize(actions: &[String], ttps: &[String], intent: AttackIntent) -> String {
    let distinct: Vec<&str> = actions
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(5)
        .collect();
    let ttp_summary =
        if ttps.is_empty() { "none".to_string() } else { ttps[.. ttps.len().min(3)].join(", ") };
    format!(
        "Intent: {}. Actions: {}. TTPs: {}. Total requests: {}.",
        intent.as_str(),
        distinct.join(", "),
        ttp_summary,
        actions.len()
    )
}

/// Empty profile for a session with no captures.
fn empty_profile(session_id: &SessionId) -> AttackerProfile {
    AttackerProfile {
        session_id: session_id.clone(),
        action_sequence: Vec::new(),
        intent: AttackIntent::Unknown,
        sophistication: 0.0,
        ttps: Vec::new(),
        unique_endpoints: 0,
        duration_seconds: 0.0,
        summary: "No data available".to_string(),
        cluster_id: None,
    }
}

// ============================================================================
// SECTION: Clustering
// ============================================================================

/// Column-wise z-score normalization.
fn normalize_columns(vectors: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let rows = vectors.len().max(1) as f64;
    let cols = vectors.first().map_or(0, Vec::len);
    let mut means = vec![0.0; cols];
    for vector in vectors {
        for (i, value) in vector.iter().enumerate() {
            means[i] += value;
        }
    }
    for mean in &mut means {
        *mean /= rows;
    }
    let mut stds = vec![0.0; cols];
    for vector in vectors {
        for (i, value) in vector.iter().enumerate() {
            let delta = value - means[i];
            stds[i] += delta * delta;
        }
    }
    for std in &mut stds {
        *std = (*std / rows).sqrt();
    }
    vectors
        .iter()
        .map(|vector| {
            vector
                .iter()
                .enumerate()
                .map(|(i, value)| (value - means[i]) / (stds[i] + NORM_EPSILON))
                .collect()
        })
        .collect()
}

/// Density clustering over normalized vectors; -1 labels noise.
fn density_cluster(vectors: &[Vec<f64>], eps: f64, min_points: usize) -> Vec<i32> {
    let n = vectors.len();
    let mut labels = vec![-1i32; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0i32;
    for start in 0 .. n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let neighbors = neighborhood(vectors, start, eps);
        if neighbors.len() < min_points {
            continue;
        }
        let cluster = next_cluster;
        next_cluster += 1;
        labels[start] = cluster;
        let mut frontier = neighbors;
        while let Some(point) = frontier.pop() {
            if labels[point] == -1 {
                labels[point] = cluster;
            }
            if visited[point] {
                continue;
            }
            visited[point] = true;
            let expansion = neighborhood(vectors, point, eps);
            if expansion.len() >= min_points {
                frontier.extend(expansion);
            }
        }
    }
    labels
}

/// Indices within `eps` of the given point, the point included.
fn neighborhood(vectors: &[Vec<f64>], index: usize, eps: f64) -> Vec<usize> {
    let origin = &vectors[index];
    vectors
        .iter()
        .enumerate()
        .filter(|(_, candidate)| euclidean(origin, candidate) <= eps)
        .map(|(i, _)| i)
        .collect()
}

/// Euclidean distance between two vectors.
fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}
