// crates/snare-analysis/src/rulegen.rs
// ============================================================================
// Module: Snare Rule Generator
// Description: Synthesizes inspection rules from confirmed exploits.
// Purpose: Generalize observed payloads into enforceable patterns.
// Dependencies: snare-core, regex
// ============================================================================

//! ## Overview
//! Rules are synthesized only from detonations with an `exploit_possible`
//! verdict. Pattern generation is attack-type-specific and generalizes the
//! observed payload into a family pattern; unrecognized types fall back to a
//! literal-escape string match. Confidence blends detonation severity,
//! payload extraction confidence, attacker sophistication, and a fixed
//! pattern-quality prior.
//! Invariants:
//! - No rule is produced unless the verdict is `exploit_possible`.
//! - Generated priorities are clamped to `[50, 150]`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use snare_core::AttackerProfile;
use snare_core::MatchKind;
use snare_core::MatchLocation;
use snare_core::PayloadArtifact;
use snare_core::PayloadKind;
use snare_core::Rule;
use snare_core::RuleAction;
use snare_core::RuleAudit;
use snare_core::RuleEvidence;
use snare_core::RuleId;
use snare_core::RuleMatch;
use snare_core::SimulationVerdict;
use snare_core::VerdictKind;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Severity weight in the confidence blend.
const CONFIDENCE_SEVERITY_WEIGHT: f64 = 0.4;
/// Payload-confidence weight in the confidence blend.
const CONFIDENCE_PAYLOAD_WEIGHT: f64 = 0.3;
/// Sophistication weight in the confidence blend.
const CONFIDENCE_SOPHISTICATION_WEIGHT: f64 = 0.2;
/// Pattern-quality prior and its weight in the confidence blend.
const CONFIDENCE_PATTERN_QUALITY: f64 = 0.8;
/// Pattern-quality weight in the confidence blend.
const CONFIDENCE_PATTERN_WEIGHT: f64 = 0.1;
/// Default sophistication fraction when no profile is available.
const DEFAULT_SOPHISTICATION_FRACTION: f64 = 0.5;
/// Lowest generated priority.
const MIN_GENERATED_PRIORITY: i32 = 50;
/// Highest generated priority.
const MAX_GENERATED_PRIORITY: i32 = 150;
/// Maximum similar payloads merged during optimization.
const MAX_OPTIMIZE_ALTERNATIVES: usize = 5;

// ============================================================================
// SECTION: Rule Generator
// ============================================================================

/// Synthesizes rules from detonation verdicts.
#[derive(Debug, Default, Clone)]
pub struct RuleGenerator;

impl RuleGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates a rule from a confirmed exploit, or `None` when the verdict
    /// does not warrant one.
    #[must_use]
    pub fn generate_rule(
        &self,
        payload: &PayloadArtifact,
        verdict: &SimulationVerdict,
        profile: Option<&AttackerProfile>,
        simulation_id: Option<&str>,
    ) -> Option<Rule> {
        if verdict.verdict != VerdictKind::ExploitPossible {
            return None;
        }
        let (pattern, kind) = generate_pattern(payload.payload_type, &payload.payload_value);
        let confidence = calculate_confidence(verdict.severity, payload.confidence, profile);
        let action = determine_action(verdict.severity, confidence);
        let priority = assign_priority(verdict.severity, confidence);
        Some(Rule {
            rule_id: RuleId::generate(),
            priority,
            matcher: RuleMatch {
                kind,
                pattern,
                locations: determine_locations(payload.payload_type),
                caseless: kind == MatchKind::Regex,
            },
            action,
            confidence,
            severity: verdict.severity,
            enabled: true,
            evidence: RuleEvidence {
                simulation_id: simulation_id.map(str::to_string),
                sample_payloads: vec![payload.payload_value.clone()],
                attack_type: Some(payload.payload_type.as_str().to_string()),
            },
            audit: RuleAudit {
                issuer: Some("analysis".to_string()),
                source_verdict: Some(verdict.verdict.as_str().to_string()),
                attacker_ttps: profile.map(|p| p.ttps.clone()).unwrap_or_default(),
            },
            expires_at: None,
        })
    }

    /// Broadens a regex rule with alternatives from similar payloads.
    #[must_use]
    pub fn optimize_rule(&self, mut rule: Rule, similar_payloads: &[String]) -> Rule {
        if similar_payloads.is_empty() || rule.matcher.kind != MatchKind::Regex {
            return rule;
        }
        let known = rule.evidence.sample_payloads.clone();
        let alternatives: Vec<String> = similar_payloads
            .iter()
            .filter(|payload| !known.contains(payload))
            .take(MAX_OPTIMIZE_ALTERNATIVES)
            .map(|payload| regex::escape(payload))
            .collect();
        if alternatives.is_empty() {
            return rule;
        }
        rule.matcher.pattern =
            format!("({}|{})", rule.matcher.pattern, alternatives.join("|"));
        rule.evidence.sample_payloads.extend(
            similar_payloads.iter().take(MAX_OPTIMIZE_ALTERNATIVES).cloned(),
        );
        rule
    }
}

// ============================================================================
// SECTION: Pattern Generation
// ============================================================================

/// Generates the match pattern for a payload family.
fn generate_pattern(kind: PayloadKind, payload: &str) -> (String, MatchKind) {
    match kind {
        PayloadKind::SqlInjection => (sql_pattern(payload), MatchKind::Regex),
        PayloadKind::Xss => (xss_pattern(payload), MatchKind::Regex),
        PayloadKind::CommandInjection => (command_pattern(payload), MatchKind::Regex),
        PayloadKind::PathTraversal => (traversal_pattern(payload), MatchKind::Regex),
        PayloadKind::FileUpload | PayloadKind::Xxe | PayloadKind::Unknown => {
            (regex::escape(payload), MatchKind::String)
        }
    }
}

/// SQL injection family patterns.
fn sql_pattern(payload: &str) -> String {
    let upper = payload.to_uppercase();
    if upper.contains("OR") && payload.contains('=') {
        r"'\s*(OR|AND)\s*'[^']*'\s*=\s*'[^']*".to_string()
    } else if upper.contains("UNION") {
        r"UNION\s+(ALL\s+)?SELECT".to_string()
    } else if payload.contains("--") || payload.contains("/*") {
        r"(--|#|/\*)".to_string()
    } else if payload.contains(';')
        && ["DROP", "DELETE", "INSERT"].iter().any(|kw| upper.contains(kw))
    {
        r";\s*(DROP|DELETE|INSERT|UPDATE|CREATE)\s+".to_string()
    } else {
        r"(UNION|SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|EXEC)\s+".to_string()
    }
}

/// Cross-site scripting family patterns.
fn xss_pattern(payload: &str) -> String {
    let lower = payload.to_lowercase();
    if lower.contains("<script") {
        r"<script[^>]*>".to_string()
    } else if lower.contains("javascript:") {
        r"javascript:\s*".to_string()
    } else if has_event_handler(&lower) {
        r#"on\w+\s*=\s*['"]?[^'"]*['"]?"#.to_string()
    } else if lower.contains("<iframe") {
        r"<iframe[^>]*>".to_string()
    } else {
        r"(<script|javascript:|on\w+\s*=|<iframe)".to_string()
    }
}

/// Command injection family patterns.
fn command_pattern(payload: &str) -> String {
    if [";", "&&", "||", "|"].iter().any(|sep| payload.contains(sep)) {
        r"[;&|]{1,2}\s*(cat|ls|whoami|wget|curl|bash|sh|nc|id|pwd)\s+".to_string()
    } else if payload.contains("$(") || payload.contains('`') {
        r"(\$\(.*?\)|`.*?`)".to_string()
    } else {
        r"(cat|ls|whoami|wget|curl|bash|sh|nc|netcat|python|perl|ruby)\s+".to_string()
    }
}

/// Path traversal family patterns.
fn traversal_pattern(payload: &str) -> String {
    let lower = payload.to_lowercase();
    if payload.contains("../") || payload.contains("..\\") {
        r"(\.\.\/|\.\.\\){2,}".to_string()
    } else if lower.contains("%2e%2e") || lower.contains("%252e") {
        r"(%2e%2e|%252e){2,}".to_string()
    } else {
        r"(\.\.\/|\.\.\\|%2e%2e){2,}".to_string()
    }
}

/// Inline event handler assignment pattern (onerror=, onload=, ...).
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time literal")]
static EVENT_HANDLER_PATTERN: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"on\w+\s*=").unwrap());

/// Detects inline event handler assignments.
fn has_event_handler(lower: &str) -> bool {
    EVENT_HANDLER_PATTERN.is_match(lower)
}

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Blends severity, payload confidence, sophistication, and pattern quality
/// into a rule confidence in `[0, 1]`.
fn calculate_confidence(
    severity: f64,
    payload_confidence: f64,
    profile: Option<&AttackerProfile>,
) -> f64 {
    let sophistication_fraction = profile
        .map_or(DEFAULT_SOPHISTICATION_FRACTION, |p| p.sophistication / 10.0);
    let confidence = CONFIDENCE_SEVERITY_WEIGHT * (severity / 10.0)
        + CONFIDENCE_PAYLOAD_WEIGHT * payload_confidence
        + CONFIDENCE_SOPHISTICATION_WEIGHT * sophistication_fraction
        + CONFIDENCE_PATTERN_WEIGHT * CONFIDENCE_PATTERN_QUALITY;
    confidence.min(1.0)
}

/// Action ladder over severity and confidence.
fn determine_action(severity: f64, confidence: f64) -> RuleAction {
    if (severity >= 9.0 && confidence >= 0.85) || (severity >= 7.0 && confidence >= 0.75) {
        RuleAction::Block
    } else if severity >= 5.0 && confidence >= 0.70 {
        RuleAction::Challenge
    } else {
        RuleAction::Tag
    }
}

/// Priority from severity and confidence, clamped to the generated band.
fn assign_priority(severity: f64, confidence: f64) -> i32 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "severity and confidence are bounded, the product fits i32"
    )]
    let raw = (severity * 10.0) as i32 + (confidence * 30.0) as i32 + 50;
    raw.clamp(MIN_GENERATED_PRIORITY, MAX_GENERATED_PRIORITY)
}

/// Locations a rule of the given family applies to.
fn determine_locations(kind: PayloadKind) -> Vec<MatchLocation> {
    match kind {
        PayloadKind::SqlInjection => {
            vec![MatchLocation::Args, MatchLocation::Body, MatchLocation::JsonValues]
        }
        PayloadKind::Xss => vec![
            MatchLocation::Args,
            MatchLocation::Body,
            MatchLocation::Headers,
            MatchLocation::JsonValues,
        ],
        PayloadKind::PathTraversal => vec![MatchLocation::Args, MatchLocation::Uri],
        PayloadKind::CommandInjection
        | PayloadKind::FileUpload
        | PayloadKind::Xxe
        | PayloadKind::Unknown => vec![MatchLocation::Args, MatchLocation::Body],
    }
}
