// crates/snare-analysis/src/jobs.rs
// ============================================================================
// Module: Snare Simulation Jobs
// Description: Bounded worker pool for queued payload detonations.
// Purpose: Run HTTP-submitted simulations off the request path.
// Dependencies: snare-core, crate::{simulator, rulegen, policy}, tokio
// ============================================================================

//! ## Overview
//! Simulations submitted over HTTP run on a bounded worker pool consuming
//! job records. The simulation store is written only from this module, so
//! readers observe whole records keyed by job id. A completed detonation
//! with an `exploit_possible` verdict immediately synthesizes a rule and
//! routes it through the policy orchestrator.
//! Invariants:
//! - A submitted job id is visible in the store before `submit` returns.
//! - Worker failures mark the job `failed`; they never poison the pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use snare_core::JobId;
use snare_core::JobStatus;
use snare_core::PayloadArtifact;
use snare_core::ProfileStore;
use snare_core::SessionId;
use snare_core::SimulationRecord;
use snare_core::SimulationStore;
use snare_core::SimulationStoreError;
use snare_core::Timestamp;
use snare_core::VerdictKind;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::sync::mpsc;

use crate::policy::PolicyOrchestrator;
use crate::rulegen::RuleGenerator;
use crate::simulator::PayloadSimulator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Queue capacity; submissions beyond this are rejected.
const QUEUE_CAPACITY: usize = 64;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One queued simulation job.
#[derive(Debug, Clone)]
pub struct SimulationJob {
    /// Job identifier.
    pub job_id: JobId,
    /// Payload queued for detonation.
    pub payload: PayloadArtifact,
    /// Shadow application reference.
    pub shadow_ref: String,
    /// Session the payload was captured from, when known.
    pub session_id: Option<SessionId>,
}

/// Errors raised when submitting jobs.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The queue is full.
    #[error("simulation queue is full")]
    QueueFull,
    /// The queue has shut down.
    #[error("simulation queue is closed")]
    Closed,
    /// The simulation store failed.
    #[error(transparent)]
    Store(#[from] SimulationStoreError),
}

// ============================================================================
// SECTION: Simulation Queue
// ============================================================================

/// Handle to the bounded simulation worker pool.
pub struct SimulationQueue {
    /// Job sender feeding the workers.
    sender: mpsc::Sender<SimulationJob>,
    /// Record store shared with readers.
    store: Arc<dyn SimulationStore>,
}

impl SimulationQueue {
    /// Starts `workers` workers over the shared receiver and returns the
    /// submission handle.
    #[must_use]
    pub fn start(
        workers: usize,
        simulator: Arc<PayloadSimulator>,
        generator: RuleGenerator,
        policy: Arc<PolicyOrchestrator>,
        profiles: Arc<dyn ProfileStore>,
        store: Arc<dyn SimulationStore>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<SimulationJob>(QUEUE_CAPACITY);
        let receiver = Arc::new(Mutex::new(receiver));
        for worker_index in 0 .. workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let simulator = Arc::clone(&simulator);
            let generator = generator.clone();
            let policy = Arc::clone(&policy);
            let profiles = Arc::clone(&profiles);
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut guard = receiver.lock().await;
                        guard.recv().await
                    };
                    let Some(job) = job else { break };
                    run_job(&job, &simulator, &generator, &policy, &*profiles, &*store).await;
                }
                tracing::debug!(worker = worker_index, "simulation worker stopped");
            });
        }
        Self {
            sender,
            store,
        }
    }

    /// Submits a payload for detonation and returns the job id.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] when the queue is full or closed, or the
    /// record cannot be stored.
    pub fn submit(
        &self,
        payload: PayloadArtifact,
        shadow_ref: &str,
        session_id: Option<SessionId>,
    ) -> Result<JobId, SubmitError> {
        let job_id = JobId::generate();
        self.store.put(SimulationRecord {
            job_id: job_id.clone(),
            status: JobStatus::Queued,
            payload: payload.clone(),
            shadow_ref: shadow_ref.to_string(),
            queued_at: Timestamp::now(),
            completed_at: None,
            verdict: None,
            error: None,
        })?;
        let job = SimulationJob {
            job_id: job_id.clone(),
            payload,
            shadow_ref: shadow_ref.to_string(),
            session_id,
        };
        self.sender.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;
        Ok(job_id)
    }

    /// Returns the simulation record store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SimulationStore> {
        &self.store
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Runs one job to completion, updating the record at each transition.
async fn run_job(
    job: &SimulationJob,
    simulator: &PayloadSimulator,
    generator: &RuleGenerator,
    policy: &PolicyOrchestrator,
    profiles: &dyn ProfileStore,
    store: &dyn SimulationStore,
) {
    update_status(store, job, JobStatus::Running, None, None);
    let verdict = simulator.simulate(&job.payload, &job.shadow_ref).await;
    let failed = verdict.verdict == VerdictKind::Error;
    update_status(
        store,
        job,
        if failed { JobStatus::Failed } else { JobStatus::Completed },
        Some(verdict.clone()),
        verdict.error.clone(),
    );
    if verdict.verdict != VerdictKind::ExploitPossible {
        return;
    }
    let profile = job
        .session_id
        .as_ref()
        .and_then(|session_id| profiles.get(session_id).ok().flatten());
    let Some(rule) = generator.generate_rule(
        &job.payload,
        &verdict,
        profile.as_ref(),
        Some(job.job_id.as_str()),
    ) else {
        return;
    };
    let decision = policy.apply(&rule, false).await;
    tracing::info!(
        job_id = %job.job_id,
        rule_id = %rule.rule_id,
        outcome = decision.outcome.as_str(),
        "rule synthesized from simulation"
    );
}

/// Writes one record transition.
fn update_status(
    store: &dyn SimulationStore,
    job: &SimulationJob,
    status: JobStatus,
    verdict: Option<snare_core::SimulationVerdict>,
    error: Option<String>,
) {
    let terminal = matches!(status, JobStatus::Completed | JobStatus::Failed);
    let record = SimulationRecord {
        job_id: job.job_id.clone(),
        status,
        payload: job.payload.clone(),
        shadow_ref: job.shadow_ref.clone(),
        queued_at: store
            .get(&job.job_id)
            .ok()
            .flatten()
            .map_or_else(Timestamp::now, |existing| existing.queued_at),
        completed_at: terminal.then(Timestamp::now),
        verdict,
        error,
    };
    if let Err(err) = store.put(record) {
        tracing::warn!(job_id = %job.job_id, error = %err, "simulation record update failed");
    }
}
