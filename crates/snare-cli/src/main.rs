// crates/snare-cli/src/main.rs
// ============================================================================
// Module: Snare CLI Entry Point
// Description: Service launcher for the inspector, router, and analysis.
// Purpose: Wire configuration, stores, bus, and engines into one binary.
// Dependencies: clap, snare-config, snare-server, tokio
// ============================================================================

//! ## Overview
//! The Snare binary launches one service per process: `snare serve
//! inspector`, `snare serve router`, or `snare serve analysis`. Startup
//! wires the injected collaborators once (object store, topic bus, stores,
//! engines) and then serves until ctrl-c; the analysis service also stops
//! its evidence consumer after the in-flight message completes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use snare_analysis::BehavioralProfiler;
use snare_analysis::DockerSandboxRunner;
use snare_analysis::EvidenceConsumer;
use snare_analysis::GeneratedRuleStore;
use snare_analysis::InMemoryProfileStore;
use snare_analysis::InMemorySimulationStore;
use snare_analysis::PayloadSimulator;
use snare_analysis::PolicyOrchestrator;
use snare_analysis::RuleGenerator;
use snare_analysis::SandboxSpec;
use snare_analysis::SimulationQueue;
use snare_bus::InMemoryTopicBus;
use snare_config::SnareConfig;
use snare_core::AuditSink;
use snare_core::NoopMetrics;
use snare_core::ProfileStore;
use snare_core::ServiceMetrics;
use snare_core::SimulationStore;
use snare_core::TopicBus;
use snare_evidence::EvidenceRetriever;
use snare_inspect::ActiveRuleSet;
use snare_inspect::AnomalyDetector;
use snare_inspect::InspectionEngine;
use snare_inspect::InspectionThresholds;
use snare_inspect::SessionWindows;
use snare_router::InMemoryPinStore;
use snare_router::SessionRouter;
use snare_server::AnalysisState;
use snare_server::AuthPolicy;
use snare_server::InspectorState;
use snare_server::RateLimitSettings;
use snare_server::RateLimiter;
use snare_server::RouterState;
use snare_server::StderrAuditSink;
use snare_server::analysis_router;
use snare_server::inspector_router;
use snare_server::routing_router;
use snare_server::serve_until_shutdown;
use snare_store::S3BlobStore;
use snare_store::S3BlobStoreConfig;
use thiserror::Error;
use tokio::sync::Semaphore;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "snare", version, about = "Adaptive web-application defense platform")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start one Snare service.
    Serve(ServeCommand),
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Service to start.
    #[command(subcommand)]
    service: Service,
}

/// Services that can be launched.
#[derive(Subcommand, Debug)]
enum Service {
    /// Inspection engine and rule management API.
    Inspector(ServiceArgs),
    /// Session pinning and routing API.
    Router(ServiceArgs),
    /// Evidence consumer, simulation, and rule policy API.
    Analysis(ServiceArgs),
}

/// Common per-service arguments.
#[derive(Args, Debug)]
struct ServiceArgs {
    /// Optional config file path (defaults to snare.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Launcher errors.
#[derive(Debug, Error)]
enum LaunchError {
    /// Configuration failed to load or validate.
    #[error("config error: {0}")]
    Config(String),
    /// A collaborator failed to initialize.
    #[error("startup error: {0}")]
    Startup(String),
    /// The server failed.
    #[error("serve error: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(serve) => match serve.service {
            Service::Inspector(args) => serve_inspector(args).await,
            Service::Router(args) => serve_router(args).await,
            Service::Analysis(args) => serve_analysis(args).await,
        },
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "snare exited with error");
            ExitCode::FAILURE
        }
    }
}

/// Initializes tracing from `RUST_LOG`, defaulting to info.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads configuration for one service.
fn load_config(args: &ServiceArgs) -> Result<SnareConfig, LaunchError> {
    SnareConfig::load(args.config.as_deref()).map_err(|err| LaunchError::Config(err.to_string()))
}

/// Resolves until ctrl-c arrives.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

// ============================================================================
// SECTION: Service Wiring
// ============================================================================

/// Launches the inspector service.
async fn serve_inspector(args: ServiceArgs) -> Result<(), LaunchError> {
    let config = load_config(&args)?;
    let bus: Arc<dyn TopicBus> = Arc::new(InMemoryTopicBus::new());
    let detector = Arc::new(AnomalyDetector::fitted_baseline(config.thresholds.poi));
    let engine = Arc::new(InspectionEngine::new(
        ActiveRuleSet::new(),
        detector,
        SessionWindows::new(config.thresholds.session_window_cap),
        bus,
        InspectionThresholds {
            behavioral_tag: config.thresholds.behavioral_tag,
        },
    ));
    let audit: Arc<dyn AuditSink> = Arc::new(StderrAuditSink);
    let metrics: Arc<dyn ServiceMetrics> = Arc::new(NoopMetrics);
    let state = Arc::new(InspectorState {
        engine,
        auth: AuthPolicy::new(config.server.auth_tokens.clone()),
        limiter: RateLimiter::new(RateLimitSettings::default()),
        audit,
        metrics,
        inflight: Arc::new(Semaphore::new(config.server.max_inflight)),
    });
    serve_until_shutdown(inspector_router(state), &config.server.inspector_bind, shutdown_signal())
        .await
        .map_err(|err| LaunchError::Serve(err.to_string()))
}

/// Launches the router service.
async fn serve_router(args: ServiceArgs) -> Result<(), LaunchError> {
    let config = load_config(&args)?;
    let bus: Arc<dyn TopicBus> = Arc::new(InMemoryTopicBus::new());
    let router = SessionRouter::new(
        Arc::new(InMemoryPinStore::new()),
        config.routing.production_url.clone(),
        config.routing.decoy_url.clone(),
    );
    let state = Arc::new(RouterState {
        router,
        auth: AuthPolicy::new(config.server.auth_tokens.clone()),
        bus,
        default_pin_hours: config.thresholds.pin_duration_hours,
        audit: Arc::new(StderrAuditSink),
        inflight: Arc::new(Semaphore::new(config.server.max_inflight)),
    });
    serve_until_shutdown(routing_router(state), &config.server.router_bind, shutdown_signal())
        .await
        .map_err(|err| LaunchError::Serve(err.to_string()))
}

/// Launches the analysis service with its evidence consumer.
async fn serve_analysis(args: ServiceArgs) -> Result<(), LaunchError> {
    let config = load_config(&args)?;
    let bus: Arc<dyn TopicBus> = Arc::new(InMemoryTopicBus::new());
    if config.bus.endpoint.is_some() {
        tracing::warn!("external bus endpoint configured; this build uses the in-process bus");
    }

    let store = S3BlobStore::connect(&S3BlobStoreConfig {
        endpoint: config.object_store.endpoint.clone(),
        region: config.object_store.region.clone(),
        force_path_style: config.object_store.force_path_style,
    })
    .await;
    let retriever = EvidenceRetriever::new(
        store,
        std::env::temp_dir().join("snare").join("evidence"),
    )
    .map_err(|err| LaunchError::Startup(err.to_string()))?;

    let runner = DockerSandboxRunner::connect()
        .map_err(|err| LaunchError::Startup(err.to_string()))?;
    let simulator = Arc::new(PayloadSimulator::new(
        Arc::new(runner),
        SandboxSpec {
            image: config.sandbox.image.clone(),
            memory_bytes: config.sandbox.memory_bytes,
            cpu_quota: config.sandbox.cpu_quota,
            ..SandboxSpec::default()
        },
        Duration::from_secs(config.sandbox.timeout_secs),
    ));

    let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
    let simulations: Arc<dyn SimulationStore> = Arc::new(InMemorySimulationStore::new());
    let policy = Arc::new(PolicyOrchestrator::new(
        config.inspector.url.clone(),
        config.server.auth_tokens.first().cloned(),
        Duration::from_secs(config.inspector.push_timeout_secs),
        config.thresholds.auto_apply,
        config.thresholds.review,
        GeneratedRuleStore::new(),
        Arc::clone(&bus),
    ));
    let generator = RuleGenerator::new();
    let queue = SimulationQueue::start(
        config.sandbox.workers,
        Arc::clone(&simulator),
        generator.clone(),
        Arc::clone(&policy),
        Arc::clone(&profiles),
        Arc::clone(&simulations),
    );

    let consumer = Arc::new(EvidenceConsumer::new(
        Arc::clone(&bus),
        retriever,
        BehavioralProfiler::new(),
        Arc::clone(&profiles),
        Arc::clone(&simulator),
        generator.clone(),
        Arc::clone(&policy),
    ));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let consumer_task = {
        let consumer = Arc::clone(&consumer);
        tokio::spawn(async move {
            if let Err(err) = consumer.run(shutdown_rx).await {
                tracing::error!(error = %err, "evidence consumer failed");
            }
        })
    };

    let state = Arc::new(AnalysisState {
        profiler: BehavioralProfiler::new(),
        profiles,
        queue,
        generator,
        policy,
        auth: AuthPolicy::new(config.server.auth_tokens.clone()),
        audit: Arc::new(StderrAuditSink),
        inflight: Arc::new(Semaphore::new(config.server.max_inflight)),
    });
    let served =
        serve_until_shutdown(analysis_router(state), &config.server.analysis_bind, shutdown_signal())
            .await;
    let _ = shutdown_tx.send(true);
    let _ = consumer_task.await;
    served.map_err(|err| LaunchError::Serve(err.to_string()))
}
