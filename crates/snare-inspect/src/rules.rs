// crates/snare-inspect/src/rules.rs
// ============================================================================
// Module: Snare Active Rule Set
// Description: In-memory rule store with compile-on-admission matchers.
// Purpose: Enforce rules with a consistent snapshot per inspection.
// Dependencies: snare-core, regex
// ============================================================================

//! ## Overview
//! The active rule set holds rules together with their compiled matchers.
//! Regex compilation happens once on admission and the matcher map is updated
//! transactionally with the rule map under one write lock. A pattern that
//! fails to compile renders its rule inert (never matching) and is surfaced
//! as a warning, never as a request-level failure. Readers take the read
//! lock for the whole evaluation, so one inspection observes a consistent
//! snapshot of the enabled rule set.
//! Invariants:
//! - Disabled rules never contribute to the rule score.
//! - Expired rules are dropped lazily on read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use regex::RegexBuilder;
use snare_core::MatchKind;
use snare_core::Rule;
use snare_core::RuleId;
use snare_core::RuleStore;
use snare_core::RuleStoreError;
use snare_core::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule score assigned when a blocking rule matches.
pub const BLOCK_RULE_SCORE: f64 = 100.0;
/// Partial score for a matching non-block string rule.
pub const STRING_PARTIAL_SCORE: f64 = 80.0;
/// Partial score for a matching non-block regex rule.
pub const REGEX_PARTIAL_SCORE: f64 = 85.0;
/// Compiled pattern size limit (bytes of compiled program).
const REGEX_SIZE_LIMIT: usize = 1 << 20;

// ============================================================================
// SECTION: Compiled Rule
// ============================================================================

/// A rule plus its admission-time compiled matcher.
#[derive(Debug)]
struct CompiledRule {
    /// The rule as admitted.
    rule: Rule,
    /// Compiled regex for regex-kind rules; `None` marks an inert rule.
    matcher: Option<regex::Regex>,
    /// Whether the pattern failed to compile.
    inert: bool,
}

/// Outcome of evaluating the rule stage for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatchOutcome {
    /// Identifier of the blocking rule, when one matched.
    pub blocked_by: Option<RuleId>,
    /// Rule score: 100 on block, otherwise the best partial score.
    pub score: f64,
}

// ============================================================================
// SECTION: Active Rule Set
// ============================================================================

/// In-memory rule store with compiled matchers.
#[derive(Debug, Default, Clone)]
pub struct ActiveRuleSet {
    /// Rules keyed by identifier behind one reader-writer lock.
    inner: Arc<RwLock<BTreeMap<RuleId, CompiledRule>>>,
}

impl ActiveRuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates the rule stage against prepared match text.
    ///
    /// Rules are visited in ascending priority order; the first matching
    /// block rule short-circuits. Expired and disabled rules are skipped
    /// (expired ones are dropped on the next mutation pass).
    #[must_use]
    pub fn evaluate(&self, match_text: &str, now: Timestamp) -> RuleMatchOutcome {
        let Ok(guard) = self.inner.read() else {
            return RuleMatchOutcome {
                blocked_by: None,
                score: 0.0,
            };
        };
        let mut ordered: Vec<&CompiledRule> = guard.values().collect();
        ordered.sort_by_key(|compiled| compiled.rule.priority);
        let mut score = 0.0f64;
        for compiled in ordered {
            if !compiled.rule.enabled || compiled.inert || compiled.rule.is_expired_at(now) {
                continue;
            }
            let matched = match compiled.rule.matcher.kind {
                MatchKind::String => match_text.contains(&compiled.rule.matcher.pattern),
                MatchKind::Regex => {
                    compiled.matcher.as_ref().is_some_and(|re| re.is_match(match_text))
                }
            };
            if !matched {
                continue;
            }
            if compiled.rule.action == snare_core::RuleAction::Block {
                return RuleMatchOutcome {
                    blocked_by: Some(compiled.rule.rule_id.clone()),
                    score: BLOCK_RULE_SCORE,
                };
            }
            let partial = match compiled.rule.matcher.kind {
                MatchKind::String => STRING_PARTIAL_SCORE,
                MatchKind::Regex => REGEX_PARTIAL_SCORE,
            };
            score = score.max(partial);
        }
        RuleMatchOutcome {
            blocked_by: None,
            score,
        }
    }

    /// Returns the number of enabled, non-inert rules.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.inner.read().map_or(0, |guard| {
            guard.values().filter(|c| c.rule.enabled && !c.inert).count()
        })
    }

    /// Compiles a rule's matcher; returns `None` plus inert flag on failure.
    fn compile(rule: &Rule) -> (Option<regex::Regex>, bool) {
        match rule.matcher.kind {
            MatchKind::String => (None, false),
            MatchKind::Regex => {
                let compiled = RegexBuilder::new(&rule.matcher.pattern)
                    .case_insensitive(rule.matcher.caseless)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build();
                match compiled {
                    Ok(regex) => (Some(regex), false),
                    Err(err) => {
                        tracing::warn!(
                            rule_id = %rule.rule_id,
                            error = %err,
                            "rule pattern failed to compile; rule is inert"
                        );
                        (None, true)
                    }
                }
            }
        }
    }

    /// Drops expired rules while the write lock is held.
    fn drop_expired(guard: &mut BTreeMap<RuleId, CompiledRule>, now: Timestamp) {
        guard.retain(|_, compiled| !compiled.rule.is_expired_at(now));
    }
}

impl RuleStore for ActiveRuleSet {
    fn create(&self, rule: Rule) -> Result<(), RuleStoreError> {
        rule.validate().map_err(|err| RuleStoreError::Invalid(err.to_string()))?;
        let mut guard = self
            .inner
            .write()
            .map_err(|_| RuleStoreError::Store("rule set lock poisoned".to_string()))?;
        Self::drop_expired(&mut guard, Timestamp::now());
        if guard.contains_key(&rule.rule_id) {
            return Err(RuleStoreError::Duplicate(rule.rule_id.as_str().to_string()));
        }
        let (matcher, inert) = Self::compile(&rule);
        guard.insert(rule.rule_id.clone(), CompiledRule {
            rule,
            matcher,
            inert,
        });
        Ok(())
    }

    fn list(&self) -> Result<Vec<Rule>, RuleStoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| RuleStoreError::Store("rule set lock poisoned".to_string()))?;
        Self::drop_expired(&mut guard, Timestamp::now());
        Ok(guard.values().map(|compiled| compiled.rule.clone()).collect())
    }

    fn get(&self, rule_id: &RuleId) -> Result<Option<Rule>, RuleStoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| RuleStoreError::Store("rule set lock poisoned".to_string()))?;
        let now = Timestamp::now();
        Ok(guard
            .get(rule_id)
            .filter(|compiled| !compiled.rule.is_expired_at(now))
            .map(|compiled| compiled.rule.clone()))
    }

    fn delete(&self, rule_id: &RuleId) -> Result<(), RuleStoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| RuleStoreError::Store("rule set lock poisoned".to_string()))?;
        if guard.remove(rule_id).is_none() {
            return Err(RuleStoreError::NotFound(rule_id.as_str().to_string()));
        }
        Ok(())
    }

    fn set_enabled(&self, rule_id: &RuleId, enabled: bool) -> Result<(), RuleStoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| RuleStoreError::Store("rule set lock poisoned".to_string()))?;
        let compiled = guard
            .get_mut(rule_id)
            .ok_or_else(|| RuleStoreError::NotFound(rule_id.as_str().to_string()))?;
        compiled.rule.enabled = enabled;
        Ok(())
    }

    fn set_expiry(
        &self,
        rule_id: &RuleId,
        expires_at: Option<Timestamp>,
    ) -> Result<(), RuleStoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| RuleStoreError::Store("rule set lock poisoned".to_string()))?;
        let compiled = guard
            .get_mut(rule_id)
            .ok_or_else(|| RuleStoreError::NotFound(rule_id.as_str().to_string()))?;
        compiled.rule.expires_at = expires_at;
        Ok(())
    }
}
