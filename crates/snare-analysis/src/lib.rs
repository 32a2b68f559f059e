// crates/snare-analysis/src/lib.rs
// ============================================================================
// Module: Snare Analysis Library
// Description: Evidence consumption, profiling, detonation, rule synthesis.
// Purpose: Expose the analysis pipeline components.
// Dependencies: snare-core, snare-evidence, bollard, reqwest
// ============================================================================

//! ## Overview
//! The analysis pipeline consumes evidence pointers, profiles attacker
//! behavior from the captured session, detonates extracted payloads in
//! isolated sandboxes, synthesizes blocking rules from confirmed exploits,
//! and routes those rules through the policy orchestrator, which pushes
//! auto-approved rules back to the inspection engine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod consumer;
pub mod jobs;
pub mod policy;
pub mod profiler;
pub mod rulegen;
pub mod sandbox;
pub mod simulator;
pub mod stores;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consumer::EvidenceConsumer;
pub use jobs::SimulationJob;
pub use jobs::SimulationQueue;
pub use policy::PolicyDecisionRecord;
pub use policy::PolicyOrchestrator;
pub use profiler::BehavioralProfiler;
pub use profiler::CaptureRecord;
pub use rulegen::RuleGenerator;
pub use sandbox::DockerSandboxRunner;
pub use sandbox::ExecOutput;
pub use sandbox::FakeSandboxRunner;
pub use sandbox::SandboxError;
pub use sandbox::SandboxHandle;
pub use sandbox::SandboxRunner;
pub use sandbox::SandboxSpec;
pub use simulator::PayloadSimulator;
pub use stores::GeneratedRuleStore;
pub use stores::InMemoryProfileStore;
pub use stores::InMemorySimulationStore;
