// crates/snare-inspect/src/engine.rs
// ============================================================================
// Module: Snare Inspection Engine
// Description: Five-stage decision function for request inspection.
// Purpose: Combine rule, ML, and behavioral signals into one decision.
// Dependencies: crate::{rules, features, anomaly, window}, snare-core
// ============================================================================

//! ## Overview
//! The decision function runs five stages in strict order: rule match,
//! feature extraction, anomaly scoring, behavioral scoring, and the combined
//! decision. A matching block rule short-circuits with a full rule score.
//! On `tag_poi` the engine emits a POI event to the telemetry topic and
//! returns the event id in the decision. Feature extraction and anomaly
//! scoring are best-effort: an unfitted scorer degrades to zero and the
//! decision still succeeds on rules alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use snare_core::Decision;
use snare_core::DecisionAction;
use snare_core::EventId;
use snare_core::RequestEnvelope;
use snare_core::ScoreBreakdown;
use snare_core::Timestamp;
use snare_core::TopicBus;

use crate::anomaly::AnomalyScorer;
use crate::features::extract_features;
use crate::rules::ActiveRuleSet;
use crate::window::SessionWindows;
use crate::window::WindowEntry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Telemetry topic carrying POI events to the analysis side channel.
const POI_TOPIC: &str = "telemetry";
/// Combined score at or above which a session is tagged POI.
const COMBINED_POI_THRESHOLD: f64 = 75.0;
/// Rule score at or above which the decision is an outright block.
const RULE_BLOCK_THRESHOLD: f64 = 90.0;
/// ML score floor for the anomaly-only POI path.
const ML_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.75;

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Tunable thresholds for the decision function.
#[derive(Debug, Clone, Copy)]
pub struct InspectionThresholds {
    /// Behavioral score above which the behavioral-anomaly tag is added.
    pub behavioral_tag: f64,
}

impl Default for InspectionThresholds {
    fn default() -> Self {
        Self {
            behavioral_tag: 0.7,
        }
    }
}

// ============================================================================
// SECTION: Inspection Engine
// ============================================================================

/// The inspection engine.
pub struct InspectionEngine {
    /// Active rule set.
    rules: ActiveRuleSet,
    /// Anomaly scorer.
    detector: Arc<dyn AnomalyScorer>,
    /// Per-session score windows.
    windows: SessionWindows,
    /// Bus used for POI event emission.
    bus: Arc<dyn TopicBus>,
    /// Decision thresholds.
    thresholds: InspectionThresholds,
}

impl InspectionEngine {
    /// Builds an engine from its injected collaborators.
    #[must_use]
    pub fn new(
        rules: ActiveRuleSet,
        detector: Arc<dyn AnomalyScorer>,
        windows: SessionWindows,
        bus: Arc<dyn TopicBus>,
        thresholds: InspectionThresholds,
    ) -> Self {
        Self {
            rules,
            detector,
            windows,
            bus,
            thresholds,
        }
    }

    /// Returns the active rule set.
    #[must_use]
    pub const fn rules(&self) -> &ActiveRuleSet {
        &self.rules
    }

    /// Returns the session windows.
    #[must_use]
    pub const fn windows(&self) -> &SessionWindows {
        &self.windows
    }

    /// Inspects one request and produces a decision.
    pub async fn inspect(&self, request: &RequestEnvelope) -> Decision {
        let now = Timestamp::now();
        let match_text = request.match_text();

        // Stage 1: rule match. A blocking rule ends the inspection here with
        // the full rule score standing in for the combined score.
        let rule_outcome = self.rules.evaluate(&match_text, now);
        if let Some(rule_id) = rule_outcome.blocked_by {
            return Decision {
                action: DecisionAction::Block,
                session_id: request.session_id.clone(),
                scores: ScoreBreakdown {
                    rule: rule_outcome.score,
                    ml: 0.0,
                    behavioral: 0.0,
                    combined: rule_outcome.score,
                },
                tags: vec!["signature_match".to_string(), "high_threat".to_string()],
                reason: format!("blocked by rule {rule_id}"),
                event_id: None,
            };
        }

        // Stage 2 + 3: feature extraction and anomaly scoring (best-effort).
        let features = extract_features(request);
        let (ml_score, is_anomaly) = self.detector.predict(&features);

        // Stage 4: behavioral score over the existing window.
        let behavioral = self.windows.behavioral_score(&request.session_id);

        // Stage 5: combine and decide.
        let scores = ScoreBreakdown::combine(rule_outcome.score, ml_score, behavioral);
        let (action, tags, reason) = self.decide(&scores, is_anomaly, behavioral);

        // Record this inspection in the session window after the decision so
        // behavioral scoring always reflects prior requests only.
        self.windows.append(&request.session_id, WindowEntry {
            timestamp: now,
            ml_score,
            features: features.to_vector(),
        });

        let event_id = if action == DecisionAction::TagPoi {
            Some(self.emit_poi_event(request, &scores, &tags).await)
        } else {
            None
        };

        Decision {
            action,
            session_id: request.session_id.clone(),
            scores,
            tags,
            reason,
            event_id,
        }
    }

    /// Applies the decision ladder to the combined scores.
    fn decide(
        &self,
        scores: &ScoreBreakdown,
        is_anomaly: bool,
        behavioral: f64,
    ) -> (DecisionAction, Vec<String>, String) {
        if scores.rule >= RULE_BLOCK_THRESHOLD {
            return (
                DecisionAction::Block,
                vec!["signature_match".to_string(), "high_threat".to_string()],
                "high rule score".to_string(),
            );
        }
        if scores.combined >= COMBINED_POI_THRESHOLD {
            let mut tags = vec!["poi".to_string(), "high_combined_score".to_string()];
            if is_anomaly {
                tags.push("ml_anomaly".to_string());
            }
            if behavioral > self.thresholds.behavioral_tag {
                tags.push("behavioral_anomaly".to_string());
            }
            let reason = format!("combined score {:.1} exceeds threshold", scores.combined);
            return (DecisionAction::TagPoi, tags, reason);
        }
        if is_anomaly && scores.ml >= ML_HIGH_CONFIDENCE_THRESHOLD {
            return (
                DecisionAction::TagPoi,
                vec!["poi".to_string(), "ml_high_confidence".to_string()],
                "ml anomaly detection triggered".to_string(),
            );
        }
        (DecisionAction::Allow, vec!["normal".to_string()], "no threats detected".to_string())
    }

    /// Emits a POI event on the telemetry side channel and returns its id.
    async fn emit_poi_event(
        &self,
        request: &RequestEnvelope,
        scores: &ScoreBreakdown,
        tags: &[String],
    ) -> EventId {
        let event_id = EventId::generate();
        let payload = serde_json::json!({
            "event": "poi_tagged",
            "event_id": &event_id,
            "session_id": &request.session_id,
            "client_ip": &request.client_ip,
            "request": {
                "method": &request.method,
                "url": &request.url,
                "headers": &request.headers,
                "body": &request.body,
                "query_params": &request.query_params,
            },
            "scores": scores,
            "tags": tags,
            "timestamp": Timestamp::now(),
        });
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        if let Err(err) =
            self.bus.publish(POI_TOPIC, request.session_id.as_str(), bytes).await
        {
            tracing::warn!(error = %err, "poi event publish failed");
        }
        event_id
    }
}
