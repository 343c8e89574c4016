//! HTTP API for the triage dashboard, probes, and Prometheus metrics
//!
//! Scans follow a pull model: every `/dashboard/data` request runs a
//! fresh scan of the requested namespace. There is no background timer.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use triage_lib::{health::ComponentStatus, scanner::ScanOrchestrator, HealthRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<ScanOrchestrator>,
    pub health_registry: HealthRegistry,
    pub default_namespace: String,
}

impl AppState {
    pub fn new(
        scanner: Arc<ScanOrchestrator>,
        health_registry: HealthRegistry,
        default_namespace: String,
    ) -> Self {
        Self {
            scanner,
            health_registry,
            default_namespace,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DataParams {
    namespace: Option<String>,
}

/// Namespace name listing for the dashboard selector
async fn namespaces(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.scanner.namespaces().await {
        Ok(names) => (StatusCode::OK, Json(json!(names))),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": err.to_string() })),
        ),
    }
}

/// Scan the requested namespace and return the aggregated report
async fn dashboard_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DataParams>,
) -> impl IntoResponse {
    let namespace = params
        .namespace
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| state.default_namespace.clone());
    let report = state.scanner.scan_namespace(&namespace).await;
    Json(report)
}

/// Aggregate cluster probe: namespace and workload counts, or an error
/// payload when the cluster is unreachable
async fn cluster_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.scanner.summarize().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "namespaces": summary.namespaces,
                "workloads": summary.workloads,
            })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "ERROR", "details": err.to_string() })),
        ),
    }
}

/// Component health - returns 200 if healthy/degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness - returns 200 if ready, 503 if not
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dashboard/namespaces", get(namespaces))
        .route("/dashboard/data", get(dashboard_data))
        .route("/health", get(cluster_health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
