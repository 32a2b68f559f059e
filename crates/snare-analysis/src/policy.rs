// crates/snare-analysis/src/policy.rs
// ============================================================================
// Module: Snare Policy Orchestrator
// Description: Decides and executes the disposition of synthesized rules.
// Purpose: Auto-apply, queue for review, or merely log generated rules.
// Dependencies: snare-core, reqwest
// ============================================================================

//! ## Overview
//! The orchestrator grades a synthesized rule by confidence: at or above the
//! auto-apply threshold (or when forced) the rule is pushed to the inspection
//! engine's rule-create API and a rule-generated event is emitted; between
//! the review and auto-apply thresholds the rule is stored for human review;
//! below the review threshold it is logged only. The orchestrator never
//! retries pushes: an unreachable inspector downgrades the disposition to
//! `pending_review`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use snare_core::PolicyOutcome;
use snare_core::Rule;
use snare_core::RuleId;
use snare_core::Timestamp;
use snare_core::TopicBus;

use crate::stores::GeneratedRuleStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Topic rule-generated events are emitted on.
const ALERTS_TOPIC: &str = "alerts";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Disposition decided for one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDecisionRecord {
    /// Decided outcome.
    pub outcome: PolicyOutcome,
    /// Human-readable reason.
    pub reason: String,
    /// Rule the decision applies to.
    pub rule_id: RuleId,
    /// Rule confidence the decision was graded on.
    pub confidence: f64,
}

// ============================================================================
// SECTION: Policy Orchestrator
// ============================================================================

/// Grades and executes rule dispositions.
pub struct PolicyOrchestrator {
    /// Inspector base URL for rule pushes.
    inspector_url: String,
    /// Bearer token presented on pushes.
    api_token: Option<String>,
    /// HTTP client for rule pushes.
    http: reqwest::Client,
    /// Push timeout.
    push_timeout: Duration,
    /// Auto-apply confidence threshold.
    auto_apply_threshold: f64,
    /// Review confidence threshold.
    review_threshold: f64,
    /// Store of generated rules and dispositions.
    rules: GeneratedRuleStore,
    /// Bus for rule-generated events.
    bus: Arc<dyn TopicBus>,
}

impl PolicyOrchestrator {
    /// Builds an orchestrator.
    #[must_use]
    pub fn new(
        inspector_url: impl Into<String>,
        api_token: Option<String>,
        push_timeout: Duration,
        auto_apply_threshold: f64,
        review_threshold: f64,
        rules: GeneratedRuleStore,
        bus: Arc<dyn TopicBus>,
    ) -> Self {
        Self {
            inspector_url: inspector_url.into(),
            api_token,
            http: reqwest::Client::new(),
            push_timeout,
            auto_apply_threshold,
            review_threshold,
            rules,
            bus,
        }
    }

    /// Returns the generated rule store.
    #[must_use]
    pub const fn rules(&self) -> &GeneratedRuleStore {
        &self.rules
    }

    /// Grades a rule without executing the disposition.
    #[must_use]
    pub fn orchestrate(&self, rule: &Rule, force: bool) -> PolicyDecisionRecord {
        let confidence = rule.confidence;
        let (outcome, reason) = if force {
            (PolicyOutcome::AutoApplied, "forced by administrator".to_string())
        } else if confidence >= self.auto_apply_threshold {
            (
                PolicyOutcome::AutoApplied,
                format!(
                    "high confidence ({confidence:.2}) >= threshold ({:.2})",
                    self.auto_apply_threshold
                ),
            )
        } else if confidence >= self.review_threshold {
            (
                PolicyOutcome::PendingReview,
                format!("medium confidence ({confidence:.2}) requires manual review"),
            )
        } else {
            (
                PolicyOutcome::LoggedOnly,
                format!("low confidence ({confidence:.2}) - logged for analysis"),
            )
        };
        PolicyDecisionRecord {
            outcome,
            reason,
            rule_id: rule.rule_id.clone(),
            confidence,
        }
    }

    /// Grades a rule and executes the disposition: stores the rule, pushes
    /// when auto-applied, and emits the rule-generated event. A failed push
    /// downgrades the disposition to `pending_review`.
    pub async fn apply(&self, rule: &Rule, force: bool) -> PolicyDecisionRecord {
        self.rules.put(rule.clone());
        let mut decision = self.orchestrate(rule, force);
        if decision.outcome == PolicyOutcome::AutoApplied && !self.push_rule(rule).await {
            decision.outcome = PolicyOutcome::PendingReview;
            decision.reason = "inspector unreachable; queued for review".to_string();
        }
        self.rules.set_outcome(&rule.rule_id, decision.outcome);
        self.emit_rule_event(rule, decision.outcome).await;
        decision
    }

    /// Pushes one rule to the inspector; true on a 2xx response.
    async fn push_rule(&self, rule: &Rule) -> bool {
        let url = format!("{}/rules", self.inspector_url.trim_end_matches('/'));
        let mut request = self
            .http
            .post(&url)
            .timeout(self.push_timeout)
            .json(&serde_json::json!({ "rule": rule }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    rule_id = %rule.rule_id,
                    status = %response.status(),
                    "inspector rejected rule push"
                );
                false
            }
            Err(err) => {
                tracing::warn!(rule_id = %rule.rule_id, error = %err, "rule push failed");
                false
            }
        }
    }

    /// Emits a rule-generated event on the alerts topic.
    async fn emit_rule_event(&self, rule: &Rule, outcome: PolicyOutcome) {
        let payload = serde_json::json!({
            "event": "rule_generated",
            "rule": rule,
            "disposition": outcome,
            "reason": format!("confidence: {:.2}", rule.confidence),
            "timestamp": Timestamp::now(),
        });
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        if let Err(err) = self.bus.publish(ALERTS_TOPIC, rule.rule_id.as_str(), bytes).await {
            tracing::warn!(error = %err, "rule event publish failed");
        }
    }
}
