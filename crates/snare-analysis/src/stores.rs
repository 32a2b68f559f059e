// crates/snare-analysis/src/stores.rs
// ============================================================================
// Module: Snare Analysis Stores
// Description: In-memory stores for profiles, simulations, and rules.
// Purpose: Back the analysis service with injected state per the interfaces.
// Dependencies: snare-core
// ============================================================================

//! ## Overview
//! In-memory implementations of the analysis-side store interfaces. Each is
//! a map behind a mutex; a KV-backed deployment swaps implementations
//! without touching call sites.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use snare_core::AttackerProfile;
use snare_core::JobId;
use snare_core::PolicyOutcome;
use snare_core::ProfileStore;
use snare_core::ProfileStoreError;
use snare_core::Rule;
use snare_core::RuleId;
use snare_core::SessionId;
use snare_core::SimulationRecord;
use snare_core::SimulationStore;
use snare_core::SimulationStoreError;

// ============================================================================
// SECTION: Profile Store
// ============================================================================

/// In-memory profile store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    /// Profiles keyed by session id.
    profiles: Arc<Mutex<BTreeMap<SessionId, AttackerProfile>>>,
}

impl InMemoryProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn put(&self, profile: AttackerProfile) -> Result<(), ProfileStoreError> {
        self.profiles
            .lock()
            .map_err(|_| ProfileStoreError::Store("profile store mutex poisoned".to_string()))?
            .insert(profile.session_id.clone(), profile);
        Ok(())
    }

    fn get(&self, session_id: &SessionId) -> Result<Option<AttackerProfile>, ProfileStoreError> {
        Ok(self
            .profiles
            .lock()
            .map_err(|_| ProfileStoreError::Store("profile store mutex poisoned".to_string()))?
            .get(session_id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<AttackerProfile>, ProfileStoreError> {
        Ok(self
            .profiles
            .lock()
            .map_err(|_| ProfileStoreError::Store("profile store mutex poisoned".to_string()))?
            .values()
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Simulation Store
// ============================================================================

/// In-memory simulation record store.
///
/// The job queue is the single writer; readers see whole records.
#[derive(Debug, Default, Clone)]
pub struct InMemorySimulationStore {
    /// Records keyed by job id.
    records: Arc<Mutex<BTreeMap<JobId, SimulationRecord>>>,
}

impl InMemorySimulationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimulationStore for InMemorySimulationStore {
    fn put(&self, record: SimulationRecord) -> Result<(), SimulationStoreError> {
        self.records
            .lock()
            .map_err(|_| SimulationStoreError::Store("simulation store mutex poisoned".to_string()))?
            .insert(record.job_id.clone(), record);
        Ok(())
    }

    fn get(&self, job_id: &JobId) -> Result<Option<SimulationRecord>, SimulationStoreError> {
        Ok(self
            .records
            .lock()
            .map_err(|_| SimulationStoreError::Store("simulation store mutex poisoned".to_string()))?
            .get(job_id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<SimulationRecord>, SimulationStoreError> {
        Ok(self
            .records
            .lock()
            .map_err(|_| SimulationStoreError::Store("simulation store mutex poisoned".to_string()))?
            .values()
            .cloned()
            .collect())
    }
}

// ============================================================================
// SECTION: Generated Rule Store
// ============================================================================

/// Store of synthesized rules and their policy dispositions.
#[derive(Debug, Default, Clone)]
pub struct GeneratedRuleStore {
    /// Rules keyed by rule id with their latest disposition.
    rules: Arc<Mutex<BTreeMap<RuleId, (Rule, Option<PolicyOutcome>)>>>,
}

impl GeneratedRuleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a rule without a disposition.
    pub fn put(&self, rule: Rule) {
        if let Ok(mut guard) = self.rules.lock() {
            guard.insert(rule.rule_id.clone(), (rule, None));
        }
    }

    /// Records the policy disposition for a rule.
    pub fn set_outcome(&self, rule_id: &RuleId, outcome: PolicyOutcome) {
        if let Ok(mut guard) = self.rules.lock() {
            if let Some(entry) = guard.get_mut(rule_id) {
                entry.1 = Some(outcome);
            }
        }
    }

    /// Fetches a rule by id.
    #[must_use]
    pub fn get(&self, rule_id: &RuleId) -> Option<Rule> {
        self.rules.lock().ok().and_then(|guard| guard.get(rule_id).map(|(rule, _)| rule.clone()))
    }

    /// Lists all rules with their dispositions.
    #[must_use]
    pub fn list(&self) -> Vec<(Rule, Option<PolicyOutcome>)> {
        self.rules.lock().map_or_else(|_| Vec::new(), |guard| guard.values().cloned().collect())
    }

    /// Number of stored rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.lock().map_or(0, |guard| guard.len())
    }

    /// Returns true when no rules are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
