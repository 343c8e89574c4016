//! Pod triage agent
//!
//! Scans the workloads of a Kubernetes namespace on request, diagnoses
//! unhealthy ones through an inference service, and emails operators with
//! TTL-based alert suppression.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use triage_lib::{
    cluster::KubectlCluster,
    diagnose::{AzureOpenAiInference, DiagnosisDispatcher},
    health::{components, HealthRegistry},
    notify::SmtpNotifier,
    scanner::ScanOrchestrator,
    triage::AlertSuppressor,
    StructuredLogger, TriageMetrics,
};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting triage-agent");

    let config = config::AgentConfig::load()?;
    info!(namespace = %config.namespace, "Agent configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CLUSTER).await;
    health_registry.register(components::INFERENCE).await;
    health_registry.register(components::NOTIFIER).await;

    // Initialize metrics and structured logging
    let metrics = TriageMetrics::new();
    let logger = StructuredLogger::new("triage-agent");
    logger.log_startup(AGENT_VERSION);

    // Wire the scan pipeline
    let cluster = Arc::new(KubectlCluster::new());
    let inference = Arc::new(
        AzureOpenAiInference::new(config.inference_config())
            .context("Failed to build inference client")?,
    );
    let notifier =
        Arc::new(SmtpNotifier::new(config.smtp_config()).context("Failed to build SMTP notifier")?);
    let suppressor = Arc::new(AlertSuppressor::with_ttl(config.alert_ttl_secs));
    let dispatcher = Arc::new(DiagnosisDispatcher::new(
        inference,
        notifier,
        suppressor,
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
    ));
    let scanner = Arc::new(ScanOrchestrator::new(
        cluster,
        dispatcher,
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
        config.scan_concurrency,
    ));

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        scanner,
        health_registry.clone(),
        config.namespace.clone(),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
