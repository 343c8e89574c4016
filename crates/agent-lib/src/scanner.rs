//! Namespace scan orchestration
//!
//! Walks every workload in a namespace, enriches each observation with
//! the logs and manifest it needs, and runs the diagnosis dispatcher on
//! them concurrently under a bounded worker pool. Failures stay contained
//! to the single workload they hit; a failed listing degrades the whole
//! namespace to an empty report.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::cluster::{ClusterError, ClusterQuery};
use crate::diagnose::DiagnosisDispatcher;
use crate::health::{components, HealthRegistry};
use crate::models::{ClusterSummary, ScanReport, WorkloadObservation};
use crate::observability::{StructuredLogger, TriageMetrics};

/// Orchestrates scans of cluster namespaces
pub struct ScanOrchestrator {
    cluster: Arc<dyn ClusterQuery>,
    dispatcher: Arc<DiagnosisDispatcher>,
    health: HealthRegistry,
    metrics: TriageMetrics,
    logger: StructuredLogger,
    max_concurrency: usize,
}

impl ScanOrchestrator {
    pub fn new(
        cluster: Arc<dyn ClusterQuery>,
        dispatcher: Arc<DiagnosisDispatcher>,
        health: HealthRegistry,
        metrics: TriageMetrics,
        logger: StructuredLogger,
        max_concurrency: usize,
    ) -> Self {
        Self {
            cluster,
            dispatcher,
            health,
            metrics,
            logger,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// All namespace names, straight from the cluster
    pub async fn namespaces(&self) -> Result<Vec<String>, ClusterError> {
        self.cluster.list_namespaces().await
    }

    /// Aggregate namespace/workload counts for the probe surface.
    /// A namespace whose listing fails contributes zero workloads; only
    /// an unreachable namespace list is an error.
    pub async fn summarize(&self) -> Result<ClusterSummary, ClusterError> {
        let namespaces = self.cluster.list_namespaces().await?;
        let mut workloads = 0;
        for namespace in &namespaces {
            workloads += self
                .cluster
                .list_workloads(namespace)
                .await
                .map(|list| list.len())
                .unwrap_or(0);
        }
        Ok(ClusterSummary {
            namespaces: namespaces.len(),
            workloads,
        })
    }

    /// Scan one namespace and aggregate per-workload reports in cluster
    /// retrieval order.
    pub async fn scan_namespace(&self, namespace: &str) -> ScanReport {
        let started = Instant::now();

        let observations = match self.cluster.list_workloads(namespace).await {
            Ok(list) => {
                self.health.set_healthy(components::CLUSTER).await;
                list
            }
            Err(err) => {
                warn!(
                    namespace = namespace,
                    error = %err,
                    "Workload listing failed; reporting empty namespace"
                );
                self.metrics.inc_cluster_errors();
                self.health
                    .set_unhealthy(components::CLUSTER, err.to_string())
                    .await;
                return ScanReport::empty(namespace);
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(observations.len());
        for observation in observations {
            let semaphore = semaphore.clone();
            let cluster = self.cluster.clone();
            let dispatcher = self.dispatcher.clone();
            let namespace = namespace.to_string();
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed while permits are handed out
                let _permit = semaphore.acquire_owned().await.ok();
                let observation = enrich(cluster.as_ref(), &namespace, observation).await;
                dispatcher.dispatch(&observation).await
            }));
        }

        // Awaiting in spawn order preserves cluster retrieval order
        let mut workloads = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => workloads.push(report),
                Err(err) => warn!(error = %err, "Workload dispatch task failed"),
            }
        }

        let diagnostics = workloads
            .iter()
            .filter_map(|report| report.diagnostic.clone())
            .collect::<Vec<_>>();

        self.metrics
            .observe_scan_latency(started.elapsed().as_secs_f64());
        self.metrics.set_workloads_scanned(workloads.len() as i64);
        self.logger
            .log_scan_complete(namespace, workloads.len(), diagnostics.len());

        ScanReport {
            namespace: namespace.to_string(),
            workloads,
            diagnostics,
        }
    }
}

/// Fill in the manifest and, for log-inspectable workloads, the raw log
/// tail. Blocked workloads never have their logs fetched. A failed log
/// fetch leaves the tail absent, which classifies as `Unknown`.
async fn enrich(
    cluster: &dyn ClusterQuery,
    namespace: &str,
    mut observation: WorkloadObservation,
) -> WorkloadObservation {
    match cluster.get_manifest(&observation.name, namespace).await {
        Ok(manifest) => observation.manifest = Some(manifest),
        Err(err) => warn!(
            pod = %observation.name,
            namespace = namespace,
            error = %err,
            "Manifest retrieval failed; diagnosing without it"
        ),
    }

    if observation.is_log_inspectable() {
        match cluster.get_logs(&observation.name, namespace).await {
            Ok(logs) => observation.raw_log_tail = Some(logs),
            Err(err) => warn!(
                pod = %observation.name,
                namespace = namespace,
                error = %err,
                "Log retrieval failed; workload left unclassified"
            ),
        }
    }

    observation
}
