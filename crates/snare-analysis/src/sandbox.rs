// crates/snare-analysis/src/sandbox.rs
// ============================================================================
// Module: Snare Sandboxes
// Description: Ephemeral isolated sandboxes for payload detonation.
// Purpose: Provision, drive, and destroy single-use shadow-app containers.
// Dependencies: bollard, futures-util, tokio
// ============================================================================

//! ## Overview
//! A sandbox is a single-use, resource-limited container on an internal-only
//! bridge network with the shadow application deployed inside. The runner
//! interface keeps detonation logic testable: the Docker-backed runner is
//! used in production and a scripted fake backs tests. Teardown is
//! idempotent and must be invoked on every exit path, including timeouts and
//! cancellation.
//! Invariants:
//! - Containers run with dropped capabilities, no-new-privileges, and a
//!   writable `/tmp` only.
//! - Sandbox networks are internal; detonations cannot reach the outside.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::models::ContainerCreateBody;
use bollard::models::ExecConfig;
use bollard::models::HostConfig;
use bollard::models::NetworkCreateRequest;
use bollard::query_parameters::CreateContainerOptionsBuilder;
use bollard::query_parameters::LogsOptionsBuilder;
use bollard::query_parameters::RemoveContainerOptionsBuilder;
use bollard::query_parameters::StartContainerOptions;
use bollard::query_parameters::StopContainerOptionsBuilder;
use futures_util::StreamExt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// CPU quota period the limit is expressed against (microseconds).
const CPU_PERIOD_MICROS: i64 = 100_000;
/// Sandbox tmpfs mount options.
const TMPFS_OPTIONS: &str = "size=100m";
/// Label marking sandbox resources for cleanup sweeps.
const SANDBOX_LABEL: &str = "snare.sandbox";
/// Container log tail collected as evidence.
const LOG_TAIL_LINES: &str = "50";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resource limits and image for one sandbox.
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    /// Shadow application image.
    pub image: String,
    /// Memory limit in bytes.
    pub memory_bytes: i64,
    /// CPU quota against a 100ms period.
    pub cpu_quota: i64,
    /// Command injecting canary seed data after startup.
    pub seed_command: Vec<String>,
}

impl Default for SandboxSpec {
    fn default() -> Self {
        Self {
            image: "snare-shadow-app:latest".to_string(),
            memory_bytes: 512 * 1024 * 1024,
            cpu_quota: 50_000,
            seed_command: vec!["/app/seed.sh".to_string()],
        }
    }
}

/// Handle to one provisioned sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxHandle {
    /// Container name.
    pub container: String,
    /// Network name.
    pub network: String,
}

/// Captured output of one sandbox command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    /// Command exit code, when reported.
    pub exit_code: Option<i64>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Sandbox errors.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Provisioning failed.
    #[error("sandbox provision failed: {0}")]
    Provision(String),
    /// Command execution failed.
    #[error("sandbox exec failed: {0}")]
    Exec(String),
    /// Log collection failed.
    #[error("sandbox log collection failed: {0}")]
    Logs(String),
}

// ============================================================================
// SECTION: Runner Interface
// ============================================================================

/// Sandbox lifecycle and execution interface.
#[async_trait]
pub trait SandboxRunner: Send + Sync {
    /// Provisions a fresh sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Provision`] when any provisioning step fails;
    /// the caller must still invoke `teardown` on the handle it may have
    /// received.
    async fn provision(&self, spec: &SandboxSpec) -> Result<SandboxHandle, SandboxError>;

    /// Executes a command inside the sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Exec`] when the command cannot be run.
    async fn exec(
        &self,
        handle: &SandboxHandle,
        command: &[String],
    ) -> Result<ExecOutput, SandboxError>;

    /// Collects trailing container logs.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Logs`] when collection fails.
    async fn logs(&self, handle: &SandboxHandle) -> Result<String, SandboxError>;

    /// Destroys the sandbox. Idempotent: destroying an already destroyed
    /// sandbox is a no-op.
    async fn teardown(&self, handle: &SandboxHandle);
}

// ============================================================================
// SECTION: Docker Runner
// ============================================================================

/// Docker-backed sandbox runner.
pub struct DockerSandboxRunner {
    /// Docker client.
    docker: Docker,
}

impl DockerSandboxRunner {
    /// Connects to the local Docker daemon.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Provision`] when the daemon is unreachable.
    pub fn connect() -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|err| SandboxError::Provision(err.to_string()))?;
        Ok(Self {
            docker,
        })
    }

    /// Shared sandbox resource labels.
    fn labels() -> HashMap<String, String> {
        HashMap::from([(SANDBOX_LABEL.to_string(), "true".to_string())])
    }
}

#[async_trait]
impl SandboxRunner for DockerSandboxRunner {
    async fn provision(&self, spec: &SandboxSpec) -> Result<SandboxHandle, SandboxError> {
        let suffix = Uuid::new_v4().simple().to_string();
        let network = format!("snare-sandbox-{suffix}");
        let container = format!("snare-shadow-{suffix}");

        self.docker
            .create_network(NetworkCreateRequest {
                name: network.clone(),
                driver: Some("bridge".to_string()),
                internal: Some(true),
                labels: Some(Self::labels()),
                ..Default::default()
            })
            .await
            .map_err(|err| SandboxError::Provision(err.to_string()))?;

        let host_config = HostConfig {
            memory: Some(spec.memory_bytes),
            cpu_period: Some(CPU_PERIOD_MICROS),
            cpu_quota: Some(spec.cpu_quota),
            cap_drop: Some(vec!["ALL".to_string()]),
            security_opt: Some(vec!["no-new-privileges".to_string()]),
            network_mode: Some(network.clone()),
            tmpfs: Some(HashMap::from([("/tmp".to_string(), TMPFS_OPTIONS.to_string())])),
            ..Default::default()
        };
        let body = ContainerCreateBody {
            image: Some(spec.image.clone()),
            labels: Some(Self::labels()),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = CreateContainerOptionsBuilder::default().name(&container).build();
        let handle = SandboxHandle {
            container: container.clone(),
            network,
        };
        if let Err(err) = self.docker.create_container(Some(options), body).await {
            self.teardown(&handle).await;
            return Err(SandboxError::Provision(err.to_string()));
        }
        if let Err(err) =
            self.docker.start_container(&container, None::<StartContainerOptions>).await
        {
            self.teardown(&handle).await;
            return Err(SandboxError::Provision(err.to_string()));
        }
        Ok(handle)
    }

    async fn exec(
        &self,
        handle: &SandboxHandle,
        command: &[String],
    ) -> Result<ExecOutput, SandboxError> {
        let created = self
            .docker
            .create_exec(&handle.container, ExecConfig {
                cmd: Some(command.to_vec()),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                ..Default::default()
            })
            .await
            .map_err(|err| SandboxError::Exec(err.to_string()))?;
        let mut stdout = String::new();
        let mut stderr = String::new();
        let started = self
            .docker
            .start_exec(&created.id, None::<bollard::exec::StartExecOptions>)
            .await
            .map_err(|err| SandboxError::Exec(err.to_string()))?;
        if let bollard::exec::StartExecResults::Attached {
            mut output, ..
        } = started
        {
            while let Some(chunk) = output.next().await {
                match chunk.map_err(|err| SandboxError::Exec(err.to_string()))? {
                    LogOutput::StdOut {
                        message,
                    } => stdout.push_str(&String::from_utf8_lossy(&message)),
                    LogOutput::StdErr {
                        message,
                    } => stderr.push_str(&String::from_utf8_lossy(&message)),
                    LogOutput::Console {
                        message,
                    } => stdout.push_str(&String::from_utf8_lossy(&message)),
                    LogOutput::StdIn {
                        ..
                    } => {}
                }
            }
        }
        let inspected = self
            .docker
            .inspect_exec(&created.id)
            .await
            .map_err(|err| SandboxError::Exec(err.to_string()))?;
        Ok(ExecOutput {
            exit_code: inspected.exit_code,
            stdout,
            stderr,
        })
    }

    async fn logs(&self, handle: &SandboxHandle) -> Result<String, SandboxError> {
        let options =
            LogsOptionsBuilder::default().stdout(true).stderr(true).tail(LOG_TAIL_LINES).build();
        let mut stream = self.docker.logs(&handle.container, Some(options));
        let mut collected = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| SandboxError::Logs(err.to_string()))?;
            collected.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
        }
        Ok(collected)
    }

    async fn teardown(&self, handle: &SandboxHandle) {
        let stop = StopContainerOptionsBuilder::default().t(5).build();
        if let Err(err) = self.docker.stop_container(&handle.container, Some(stop)).await {
            tracing::debug!(error = %err, container = %handle.container, "sandbox stop skipped");
        }
        let remove = RemoveContainerOptionsBuilder::default().force(true).build();
        if let Err(err) = self.docker.remove_container(&handle.container, Some(remove)).await {
            tracing::debug!(error = %err, container = %handle.container, "sandbox remove skipped");
        }
        if let Err(err) = self.docker.remove_network(&handle.network).await {
            tracing::debug!(error = %err, network = %handle.network, "sandbox network remove skipped");
        }
    }
}

// ============================================================================
// SECTION: Fake Runner
// ============================================================================

/// Scripted sandbox runner for tests.
///
/// Responses are matched by substring against the joined command; the first
/// match wins. Provision and teardown counts are recorded so tests can
/// assert the teardown-on-every-path invariant.
#[derive(Debug, Default)]
pub struct FakeSandboxRunner {
    /// Response scripts keyed by command substring.
    responses: Vec<(String, ExecOutput)>,
    /// Fail provisioning when set.
    fail_provision: bool,
    /// Count of provisioned sandboxes.
    provisioned: Mutex<usize>,
    /// Count of teardown calls.
    torn_down: Mutex<usize>,
    /// Container log text returned by `logs`.
    log_text: String,
}

impl FakeSandboxRunner {
    /// Runner behaving like a vulnerable shadow application.
    #[must_use]
    pub fn vulnerable() -> Self {
        Self {
            responses: vec![
                (
                    "id=".to_string(),
                    ExecOutput {
                        exit_code: Some(0),
                        stdout: "{\"users\":[{\"email\":\"admin@shadow.local\"},\
                                 {\"email\":\"user@shadow.local\"}]}"
                            .to_string(),
                        stderr: String::new(),
                    },
                ),
                (
                    "name=".to_string(),
                    ExecOutput {
                        exit_code: Some(0),
                        stdout: "<html><script>alert(1)</script></html>".to_string(),
                        stderr: String::new(),
                    },
                ),
                (
                    "cmd=".to_string(),
                    ExecOutput {
                        exit_code: Some(0),
                        stdout: "uid=0(root) gid=0(root)".to_string(),
                        stderr: String::new(),
                    },
                ),
                (
                    "file=".to_string(),
                    ExecOutput {
                        exit_code: Some(0),
                        stdout: "root:x:0:0:root:/root:/bin/bash".to_string(),
                        stderr: String::new(),
                    },
                ),
            ],
            fail_provision: false,
            provisioned: Mutex::new(0),
            torn_down: Mutex::new(0),
            log_text: "shadow app listening on :5000".to_string(),
        }
    }

    /// Runner behaving like a patched shadow application.
    #[must_use]
    pub fn hardened() -> Self {
        Self {
            // A patched exec endpoint rejects the command with no output.
            responses: vec![(
                "cmd=".to_string(),
                ExecOutput {
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: "command rejected".to_string(),
                },
            )],
            fail_provision: false,
            provisioned: Mutex::new(0),
            torn_down: Mutex::new(0),
            log_text: "shadow app listening on :5000".to_string(),
        }
    }

    /// Runner whose provisioning always fails.
    #[must_use]
    pub fn broken() -> Self {
        Self {
            fail_provision: true,
            ..Self::hardened()
        }
    }

    /// Number of provisioned sandboxes.
    #[must_use]
    pub fn provisioned_count(&self) -> usize {
        self.provisioned.lock().map(|guard| *guard).unwrap_or(0)
    }

    /// Number of teardown calls.
    #[must_use]
    pub fn teardown_count(&self) -> usize {
        self.torn_down.lock().map(|guard| *guard).unwrap_or(0)
    }
}

#[async_trait]
impl SandboxRunner for FakeSandboxRunner {
    async fn provision(&self, _spec: &SandboxSpec) -> Result<SandboxHandle, SandboxError> {
        if self.fail_provision {
            return Err(SandboxError::Provision("fake provisioning failure".to_string()));
        }
        if let Ok(mut guard) = self.provisioned.lock() {
            *guard += 1;
        }
        Ok(SandboxHandle {
            container: "fake-shadow".to_string(),
            network: "fake-network".to_string(),
        })
    }

    async fn exec(
        &self,
        _handle: &SandboxHandle,
        command: &[String],
    ) -> Result<ExecOutput, SandboxError> {
        let joined = command.join(" ");
        for (needle, output) in &self.responses {
            if joined.contains(needle) {
                return Ok(output.clone());
            }
        }
        Ok(ExecOutput {
            exit_code: Some(0),
            stdout: "{\"users\":[]}".to_string(),
            stderr: String::new(),
        })
    }

    async fn logs(&self, _handle: &SandboxHandle) -> Result<String, SandboxError> {
        Ok(self.log_text.clone())
    }

    async fn teardown(&self, _handle: &SandboxHandle) {
        if let Ok(mut guard) = self.torn_down.lock() {
            *guard += 1;
        }
    }
}
