// crates/snare-analysis/src/simulator.rs
// ============================================================================
// Module: Snare Payload Simulator
// Description: Detonates captured payloads against the shadow application.
// Purpose: Produce a verdict, severity, and evidence for each payload.
// Dependencies: crate::sandbox, snare-core, tokio
// ============================================================================

//! ## Overview
//! A detonation provisions a single-use sandbox, seeds canary data, executes
//! a type-appropriate probe against the shadow application, classifies the
//! response, and collects evidence. The sandbox is destroyed on every exit
//! path: success, failure, and timeout. Simulation errors become a verdict
//! of `error` with severity zero rather than a pipeline failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use snare_core::DetonationEvidence;
use snare_core::PayloadArtifact;
use snare_core::PayloadKind;
use snare_core::SimulationVerdict;
use snare_core::VerdictKind;

use crate::sandbox::ExecOutput;
use crate::sandbox::SandboxError;
use crate::sandbox::SandboxRunner;
use crate::sandbox::SandboxSpec;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Shadow application base URL inside the sandbox.
const SHADOW_APP_URL: &str = "http://localhost:5000";
/// Canary account domain seeded into the shadow database.
const CANARY_DOMAIN: &str = "@shadow.local";
/// Canary marker expected from traversal probes.
const CANARY_PASSWD_MARKER: &str = "root:";
/// Retained tail of container logs in evidence.
const LOG_RETENTION_CHARS: usize = 500;

// ============================================================================
// SECTION: Simulator
// ============================================================================

/// Detonates payloads inside sandboxes provided by a runner.
pub struct PayloadSimulator {
    /// Sandbox runner.
    runner: Arc<dyn SandboxRunner>,
    /// Sandbox spec applied per detonation.
    spec: SandboxSpec,
    /// Wall-clock timeout per detonation.
    timeout: Duration,
}

impl PayloadSimulator {
    /// Builds a simulator from its runner, spec, and timeout.
    #[must_use]
    pub fn new(runner: Arc<dyn SandboxRunner>, spec: SandboxSpec, timeout: Duration) -> Self {
        Self {
            runner,
            spec,
            timeout,
        }
    }

    /// Detonates one payload and always destroys the sandbox afterwards.
    pub async fn simulate(&self, payload: &PayloadArtifact, shadow_ref: &str) -> SimulationVerdict {
        let started = Instant::now();
        let handle = match self.runner.provision(&self.spec).await {
            Ok(handle) => handle,
            Err(err) => return error_verdict(payload, &err, started),
        };

        let outcome = tokio::time::timeout(self.timeout, async {
            self.runner.exec(&handle, &self.spec.seed_command).await?;
            let probe = probe_command(payload);
            let output = self.runner.exec(&handle, &probe).await?;
            let logs = self.runner.logs(&handle).await.unwrap_or_default();
            Ok::<(ExecOutput, String), SandboxError>((output, logs))
        })
        .await;

        // Teardown runs on success, failure, and timeout alike.
        self.runner.teardown(&handle).await;

        let (output, logs) = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => return error_verdict(payload, &err, started),
            Err(_) => {
                return timeout_verdict(payload, self.timeout, started);
            }
        };

        let verdict = analyze_result(payload, &output);
        let severity = calculate_severity(verdict, payload);
        let tail_start = logs.len().saturating_sub(LOG_RETENTION_CHARS);
        SimulationVerdict {
            verdict,
            severity,
            attack_type: payload.payload_type,
            evidence: DetonationEvidence {
                container_logs: logs.get(tail_start ..).unwrap_or(&logs).to_string(),
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
            },
            reproduction_steps: reproduction_steps(payload, shadow_ref),
            execution_time_ms: elapsed_ms(started),
            error: None,
        }
    }
}

// ============================================================================
// SECTION: Probe Construction
// ============================================================================

/// Builds the probe command for a payload type.
fn probe_command(payload: &PayloadArtifact) -> Vec<String> {
    let value = &payload.payload_value;
    let url = match payload.payload_type {
        PayloadKind::SqlInjection => format!("{SHADOW_APP_URL}/api/v1/users?id={value}"),
        PayloadKind::Xss => format!("{SHADOW_APP_URL}/api/v1/users?name={value}"),
        PayloadKind::PathTraversal => format!("{SHADOW_APP_URL}/api/v1/documents?file={value}"),
        PayloadKind::CommandInjection => {
            return vec![
                "curl".to_string(),
                "-s".to_string(),
                "-d".to_string(),
                format!("cmd={value}"),
                format!("{SHADOW_APP_URL}/api/v1/exec"),
            ];
        }
        PayloadKind::FileUpload | PayloadKind::Xxe | PayloadKind::Unknown => {
            format!("{SHADOW_APP_URL}/api/v1/users")
        }
    };
    vec!["curl".to_string(), "-s".to_string(), url]
}

// ============================================================================
// SECTION: Verdict Analysis
// ============================================================================

/// Classifies a probe result into a verdict.
fn analyze_result(payload: &PayloadArtifact, output: &ExecOutput) -> VerdictKind {
    let stdout = output.stdout.to_lowercase();
    let stderr = output.stderr.to_lowercase();
    let exploited = match payload.payload_type {
        PayloadKind::SqlInjection => {
            let upper = payload.payload_value.to_uppercase();
            let leaked = stdout.contains(CANARY_DOMAIN)
                && (upper.contains("OR") || upper.contains("UNION"));
            let errored = stderr.contains("syntax error") || stderr.contains("sqlite");
            leaked || errored
        }
        PayloadKind::Xss => stdout.contains("<script"),
        PayloadKind::CommandInjection => output.exit_code == Some(0) && !output.stdout.is_empty(),
        PayloadKind::PathTraversal => {
            stdout.contains(CANARY_PASSWD_MARKER) || stdout.contains("etc/passwd")
        }
        PayloadKind::FileUpload | PayloadKind::Xxe | PayloadKind::Unknown => false,
    };
    if exploited { VerdictKind::ExploitPossible } else { VerdictKind::ExploitImprobable }
}

/// Severity for a verdict: the attack-type base score scaled by payload
/// confidence and capped at ten; no exploitation means zero.
fn calculate_severity(verdict: VerdictKind, payload: &PayloadArtifact) -> f64 {
    if verdict != VerdictKind::ExploitPossible {
        return 0.0;
    }
    let base = match payload.payload_type {
        PayloadKind::CommandInjection => 10.0,
        PayloadKind::SqlInjection | PayloadKind::Xxe => 9.0,
        PayloadKind::PathTraversal | PayloadKind::FileUpload => 8.5,
        PayloadKind::Xss => 7.0,
        PayloadKind::Unknown => 5.0,
    };
    (base * payload.confidence).min(10.0)
}

/// Reproduction steps for the verdict record.
fn reproduction_steps(payload: &PayloadArtifact, shadow_ref: &str) -> Vec<String> {
    vec![
        format!("Deploy shadow app from ref: {shadow_ref}"),
        "Seed database with canary data".to_string(),
        format!("Send request with payload type: {}", payload.payload_type.as_str()),
        format!("Payload value: {}", payload.payload_value),
        "Observe response for unauthorized data access or errors".to_string(),
        "Check container logs for exploitation evidence".to_string(),
    ]
}

// ============================================================================
// SECTION: Failure Verdicts
// ============================================================================

/// Error verdict with severity zero.
fn error_verdict(
    payload: &PayloadArtifact,
    err: &SandboxError,
    started: Instant,
) -> SimulationVerdict {
    SimulationVerdict {
        verdict: VerdictKind::Error,
        severity: 0.0,
        attack_type: payload.payload_type,
        evidence: DetonationEvidence::default(),
        reproduction_steps: Vec::new(),
        execution_time_ms: elapsed_ms(started),
        error: Some(err.to_string()),
    }
}

/// Timeout verdict with severity zero.
fn timeout_verdict(
    payload: &PayloadArtifact,
    timeout: Duration,
    started: Instant,
) -> SimulationVerdict {
    SimulationVerdict {
        verdict: VerdictKind::Error,
        severity: 0.0,
        attack_type: payload.payload_type,
        evidence: DetonationEvidence::default(),
        reproduction_steps: Vec::new(),
        execution_time_ms: elapsed_ms(started),
        error: Some(format!("detonation timed out after {}s", timeout.as_secs())),
    }
}

/// Milliseconds elapsed since a start instant.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
