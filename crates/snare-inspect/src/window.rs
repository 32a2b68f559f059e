// crates/snare-inspect/src/window.rs
// ============================================================================
// Module: Snare Session Windows
// Description: Capped per-session score history for behavioral scoring.
// Purpose: Track recent ML scores per session with atomic append/truncate.
// Dependencies: snare-core
// ============================================================================

//! ## Overview
//! Each session carries an ordered, capped window of `{timestamp, ml_score,
//! feature vector}` entries. Appends evict the oldest entry past the cap. The
//! map is sharded by session id so per-session append-and-truncate is atomic
//! without serializing unrelated sessions.
//! Invariants:
//! - Window length never exceeds the cap.
//! - Timestamps within a window are non-decreasing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::Mutex;

use snare_core::SessionId;
use snare_core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of lock shards.
const SHARD_COUNT: usize = 16;
/// Minimum window length before behavioral scoring engages.
const MIN_WINDOW_FOR_BEHAVIORAL: usize = 3;
/// Variance weight in the behavioral score.
const BEHAVIORAL_VARIANCE_WEIGHT: f64 = 2.0;
/// Mean weight in the behavioral score.
const BEHAVIORAL_MEAN_WEIGHT: f64 = 0.5;

// ============================================================================
// SECTION: Window Entry
// ============================================================================

/// One recorded inspection within a session window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEntry {
    /// Inspection instant.
    pub timestamp: Timestamp,
    /// ML anomaly score recorded for the request.
    pub ml_score: f64,
    /// Feature vector in frozen order.
    pub features: Vec<f64>,
}

// ============================================================================
// SECTION: Session Windows
// ============================================================================

/// Sharded per-session score windows.
#[derive(Debug, Clone)]
pub struct SessionWindows {
    /// Lock shards, each holding a session map.
    shards: Arc<Vec<Mutex<BTreeMap<SessionId, VecDeque<WindowEntry>>>>>,
    /// Maximum entries retained per session.
    cap: usize,
}

impl SessionWindows {
    /// Creates windows with the given per-session cap.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        let shards = (0 .. SHARD_COUNT).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self {
            shards: Arc::new(shards),
            cap: cap.max(1),
        }
    }

    /// Picks the shard for a session.
    fn shard(&self, session_id: &SessionId) -> &Mutex<BTreeMap<SessionId, VecDeque<WindowEntry>>> {
        let mut hasher = DefaultHasher::new();
        session_id.hash(&mut hasher);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "shard index is bounded by the shard count"
        )]
        let index = (hasher.finish() % SHARD_COUNT as u64) as usize;
        &self.shards[index]
    }

    /// Appends an entry and truncates the window to the cap.
    ///
    /// Appends are silently dropped when the shard lock is poisoned; the
    /// inspection path must not fail on window bookkeeping.
    pub fn append(&self, session_id: &SessionId, entry: WindowEntry) {
        if let Ok(mut guard) = self.shard(session_id).lock() {
            let window = guard.entry(session_id.clone()).or_default();
            window.push_back(entry);
            while window.len() > self.cap {
                window.pop_front();
            }
        }
    }

    /// Computes the behavioral score for a session.
    ///
    /// With fewer than three recorded entries the score is 0. Otherwise the
    /// score is `clamp01(2 * variance + 0.5 * mean)` over the recent ML
    /// scores; the weights are heuristics carried as constants here and
    /// overridable in engine thresholds.
    #[must_use]
    pub fn behavioral_score(&self, session_id: &SessionId) -> f64 {
        let Ok(guard) = self.shard(session_id).lock() else {
            return 0.0;
        };
        let Some(window) = guard.get(session_id) else {
            return 0.0;
        };
        if window.len() < MIN_WINDOW_FOR_BEHAVIORAL {
            return 0.0;
        }
        let scores: Vec<f64> = window.iter().map(|entry| entry.ml_score).collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance =
            scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / scores.len() as f64;
        BEHAVIORAL_VARIANCE_WEIGHT
            .mul_add(variance, BEHAVIORAL_MEAN_WEIGHT * mean)
            .clamp(0.0, 1.0)
    }

    /// Returns a session's window contents, oldest first.
    #[must_use]
    pub fn entries(&self, session_id: &SessionId) -> Vec<WindowEntry> {
        self.shard(session_id)
            .lock()
            .ok()
            .and_then(|guard| guard.get(session_id).map(|w| w.iter().cloned().collect()))
            .unwrap_or_default()
    }

    /// Returns the number of tracked sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.shards.iter().filter_map(|shard| shard.lock().ok().map(|g| g.len())).sum()
    }
}
