// crates/snare-inspect/src/anomaly.rs
// ============================================================================
// Module: Snare Anomaly Scorer
// Description: Unsupervised isolation-forest anomaly scoring.
// Purpose: Map standardized feature vectors to an anomaly score in [0, 1].
// Dependencies: crate::features, rand
// ============================================================================

//! ## Overview
//! The anomaly scorer is an isolation forest over standardized feature
//! vectors: anomalous requests isolate in fewer random splits, so their
//! average path length is short and their score approaches 1. The forest and
//! scaler are fitted at startup on synthetic benign traffic generated from a
//! seeded RNG, which makes scores deterministic across processes for
//! identical inputs.
//! Invariants:
//! - Scores are clamped to `[0, 1]`; 1 means highly anomalous.
//! - An unfitted scorer returns 0.0 and never fails the inspection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use snare_core::RequestEnvelope;
use snare_core::SessionId;

use crate::features::FeatureSet;
use crate::features::extract_features;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of trees in the forest.
const FOREST_SIZE: usize = 100;
/// Subsample size per tree.
const SUBSAMPLE_SIZE: usize = 256;
/// Number of synthetic baseline requests fitted at startup.
const BASELINE_SAMPLES: usize = 512;
/// Seed for the deterministic baseline fit.
const BASELINE_SEED: u64 = 42;
/// Guard against zero standard deviation during standardization.
const STD_EPSILON: f64 = 1e-8;

/// Benign URL paths sampled when synthesizing baseline traffic.
const BASELINE_PATHS: &[&str] = &[
    "/",
    "/index.html",
    "/about",
    "/api/v1/users",
    "/api/v1/products",
    "/api/v1/orders",
    "/api/v1/search",
    "/static/css/app.css",
    "/static/js/app.js",
    "/images/logo.png",
    "/docs/getting-started",
    "/blog/latest",
];

/// Benign user agents sampled when synthesizing baseline traffic.
const BASELINE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15",
];

/// Benign query parameter names sampled when synthesizing baseline traffic.
const BASELINE_PARAMS: &[(&str, &str)] = &[
    ("page", "2"),
    ("limit", "25"),
    ("sort", "created_at"),
    ("q", "laptop"),
    ("category", "books"),
    ("lang", "en"),
];

// ============================================================================
// SECTION: Standard Scaler
// ============================================================================

/// Per-feature mean/std standardization fitted from samples.
#[derive(Debug, Clone)]
struct StandardScaler {
    /// Per-feature means.
    means: Vec<f64>,
    /// Per-feature standard deviations.
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fits means and standard deviations from row-major samples.
    fn fit(samples: &[Vec<f64>]) -> Self {
        let rows = samples.len().max(1) as f64;
        let cols = samples.first().map_or(0, Vec::len);
        let mut means = vec![0.0; cols];
        for sample in samples {
            for (i, value) in sample.iter().enumerate() {
                means[i] += value;
            }
        }
        for mean in &mut means {
            *mean /= rows;
        }
        let mut stds = vec![0.0; cols];
        for sample in samples {
            for (i, value) in sample.iter().enumerate() {
                let delta = value - means[i];
                stds[i] += delta * delta;
            }
        }
        for std in &mut stds {
            *std = (*std / rows).sqrt();
        }
        Self {
            means,
            stds,
        }
    }

    /// Standardizes one vector.
    fn transform(&self, vector: &[f64]) -> Vec<f64> {
        vector
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let mean = self.means.get(i).copied().unwrap_or(0.0);
                let std = self.stds.get(i).copied().unwrap_or(1.0);
                (value - mean) / (std + STD_EPSILON)
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Isolation Forest
// ============================================================================

/// One node of an isolation tree.
#[derive(Debug, Clone)]
enum TreeNode {
    /// External node holding the residual sample count.
    Leaf {
        /// Number of samples that reached this leaf during fitting.
        size: usize,
    },
    /// Internal split node.
    Split {
        /// Feature index the split tests.
        feature: usize,
        /// Split threshold.
        value: f64,
        /// Subtree for values below the threshold.
        left: Box<TreeNode>,
        /// Subtree for values at or above the threshold.
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    /// Builds a tree over the given sample rows.
    fn build(samples: &[Vec<f64>], rows: &[usize], depth: usize, max_depth: usize, rng: &mut StdRng) -> Self {
        if rows.len() <= 1 || depth >= max_depth {
            return Self::Leaf {
                size: rows.len(),
            };
        }
        let cols = samples.first().map_or(0, Vec::len);
        if cols == 0 {
            return Self::Leaf {
                size: rows.len(),
            };
        }
        // Pick a split dimension with spread; give up after a few draws so
        // constant subsamples terminate.
        for _ in 0 .. 8 {
            let feature = rng.gen_range(0 .. cols);
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for row in rows {
                let value = samples[*row][feature];
                min = min.min(value);
                max = max.max(value);
            }
            if max <= min {
                continue;
            }
            let value = rng.gen_range(min .. max);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.iter().copied().partition(|row| samples[*row][feature] < value);
            if left_rows.is_empty() || right_rows.is_empty() {
                continue;
            }
            return Self::Split {
                feature,
                value,
                left: Box::new(Self::build(samples, &left_rows, depth + 1, max_depth, rng)),
                right: Box::new(Self::build(samples, &right_rows, depth + 1, max_depth, rng)),
            };
        }
        Self::Leaf {
            size: rows.len(),
        }
    }

    /// Path length for one standardized vector.
    fn path_length(&self, vector: &[f64], depth: f64) -> f64 {
        match self {
            Self::Leaf {
                size,
            } => depth + average_path_length(*size),
            Self::Split {
                feature,
                value,
                left,
                right,
            } => {
                let observed = vector.get(*feature).copied().unwrap_or(0.0);
                if observed < *value {
                    left.path_length(vector, depth + 1.0)
                } else {
                    right.path_length(vector, depth + 1.0)
                }
            }
        }
    }
}

/// Average unsuccessful-search path length in a binary search tree of `n`
/// nodes, the standard isolation-forest normalizer.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    let harmonic = (n - 1.0).ln() + 0.577_215_664_901_532_9;
    2.0f64.mul_add(harmonic, -(2.0 * (n - 1.0) / n))
}

// ============================================================================
// SECTION: Scorer Interface
// ============================================================================

/// Anomaly scoring seam used by the inspection engine.
///
/// Implementations must be best-effort: scoring never fails, it degrades to
/// `(0.0, false)`.
pub trait AnomalyScorer: Send + Sync {
    /// Scores a feature set; returns `(anomaly_score, is_anomaly)`.
    fn predict(&self, features: &FeatureSet) -> (f64, bool);
}

// ============================================================================
// SECTION: Anomaly Detector
// ============================================================================

/// Isolation-forest anomaly scorer with a standard scaler front end.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    /// Fitted scaler, absent until `fit` runs.
    scaler: Option<StandardScaler>,
    /// Fitted trees, empty until `fit` runs.
    trees: Vec<TreeNode>,
    /// Subsample size used during fitting.
    subsample: usize,
    /// Anomaly threshold for `is_anomaly`.
    threshold: f64,
}

impl AnomalyDetector {
    /// Creates an unfitted detector; scores are 0.0 until fitted.
    #[must_use]
    pub const fn unfitted(threshold: f64) -> Self {
        Self {
            scaler: None,
            trees: Vec::new(),
            subsample: SUBSAMPLE_SIZE,
            threshold,
        }
    }

    /// Creates a detector fitted on deterministic synthetic benign traffic.
    #[must_use]
    pub fn fitted_baseline(threshold: f64) -> Self {
        let mut detector = Self::unfitted(threshold);
        let baseline = synthetic_baseline();
        detector.fit(&baseline);
        detector
    }

    /// Fits the scaler and forest from feature sets.
    pub fn fit(&mut self, samples: &[FeatureSet]) {
        if samples.is_empty() {
            return;
        }
        let vectors: Vec<Vec<f64>> = samples.iter().map(FeatureSet::to_vector).collect();
        let scaler = StandardScaler::fit(&vectors);
        let scaled: Vec<Vec<f64>> = vectors.iter().map(|v| scaler.transform(v)).collect();
        let subsample = SUBSAMPLE_SIZE.min(scaled.len());
        let max_depth = (subsample as f64).log2().ceil().max(1.0);
        #[allow(clippy::cast_possible_truncation, reason = "depth is a small tree height")]
        #[allow(clippy::cast_sign_loss, reason = "log2 of a positive count is positive")]
        let max_depth = max_depth as usize;
        let mut rng = StdRng::seed_from_u64(BASELINE_SEED);
        let mut trees = Vec::with_capacity(FOREST_SIZE);
        for _ in 0 .. FOREST_SIZE {
            let rows: Vec<usize> =
                (0 .. subsample).map(|_| rng.gen_range(0 .. scaled.len())).collect();
            trees.push(TreeNode::build(&scaled, &rows, 0, max_depth, &mut rng));
        }
        self.scaler = Some(scaler);
        self.trees = trees;
        self.subsample = subsample;
    }

    /// Scores a feature set; returns `(anomaly_score, is_anomaly)`.
    ///
    /// An unfitted detector returns `(0.0, false)`.
    #[must_use]
    pub fn predict(&self, features: &FeatureSet) -> (f64, bool) {
        let Some(scaler) = &self.scaler else {
            return (0.0, false);
        };
        if self.trees.is_empty() {
            return (0.0, false);
        }
        let scaled = scaler.transform(&features.to_vector());
        let total: f64 = self.trees.iter().map(|tree| tree.path_length(&scaled, 0.0)).sum();
        let mean_path = total / self.trees.len() as f64;
        let normalizer = average_path_length(self.subsample).max(STD_EPSILON);
        let score = 2.0f64.powf(-mean_path / normalizer).clamp(0.0, 1.0);
        (score, score >= self.threshold)
    }

    /// Returns the configured anomaly threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns true once the detector has been fitted.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.scaler.is_some()
    }
}

impl AnomalyScorer for AnomalyDetector {
    fn predict(&self, features: &FeatureSet) -> (f64, bool) {
        Self::predict(self, features)
    }
}

// ============================================================================
// SECTION: Synthetic Baseline
// ============================================================================

/// Generates deterministic benign request features for the baseline fit.
fn synthetic_baseline() -> Vec<FeatureSet> {
    let mut rng = StdRng::seed_from_u64(BASELINE_SEED);
    let mut samples = Vec::with_capacity(BASELINE_SAMPLES);
    for i in 0 .. BASELINE_SAMPLES {
        let path = BASELINE_PATHS[rng.gen_range(0 .. BASELINE_PATHS.len())];
        let user_agent = BASELINE_USER_AGENTS[rng.gen_range(0 .. BASELINE_USER_AGENTS.len())];
        let mut query_params = BTreeMap::new();
        let mut url = path.to_string();
        for _ in 0 .. rng.gen_range(0usize ..= 2) {
            let (name, value) = BASELINE_PARAMS[rng.gen_range(0 .. BASELINE_PARAMS.len())];
            if query_params.is_empty() {
                url.push('?');
            } else {
                url.push('&');
            }
            url.push_str(name);
            url.push('=');
            url.push_str(value);
            query_params.insert(name.to_string(), value.to_string());
        }
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), user_agent.to_string());
        headers.insert("Accept".to_string(), "text/html,application/json".to_string());
        if rng.gen_bool(0.5) {
            headers.insert("Referer".to_string(), "https://example.com/".to_string());
        }
        let request = RequestEnvelope {
            method: "GET".to_string(),
            url,
            headers,
            body: String::new(),
            query_params,
            client_ip: "198.51.100.10".to_string(),
            session_id: SessionId::new(format!("baseline_{i}")),
            metadata: BTreeMap::new(),
        };
        samples.push(extract_features(&request));
    }
    samples
}
