//! Observability infrastructure for the triage agent
//!
//! Provides:
//! - Prometheus metrics (scan/diagnosis latency, alert counters,
//!   suppression cache size)
//! - Structured JSON logging of significant events with tracing

use prometheus::{register_histogram, register_int_gauge, Histogram, IntGauge};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for scan and diagnosis latency (in seconds). Both
/// operations block on network I/O, so the buckets run coarse.
const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<TriageMetricsInner> = OnceLock::new();

struct TriageMetricsInner {
    scan_latency_seconds: Histogram,
    diagnosis_latency_seconds: Histogram,
    workloads_scanned: IntGauge,
    suppression_entries: IntGauge,
    alerts_sent: IntGauge,
    alerts_suppressed: IntGauge,
    diagnosis_failures: IntGauge,
    notification_failures: IntGauge,
    cluster_errors: IntGauge,
}

impl TriageMetricsInner {
    fn new() -> Self {
        Self {
            scan_latency_seconds: register_histogram!(
                "pod_triage_scan_latency_seconds",
                "Time spent scanning one namespace end to end",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register scan_latency_seconds"),

            diagnosis_latency_seconds: register_histogram!(
                "pod_triage_diagnosis_latency_seconds",
                "Time spent waiting on the inference service per diagnosis",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register diagnosis_latency_seconds"),

            workloads_scanned: register_int_gauge!(
                "pod_triage_workloads_scanned",
                "Number of workloads covered by the most recent scan"
            )
            .expect("Failed to register workloads_scanned"),

            suppression_entries: register_int_gauge!(
                "pod_triage_suppression_entries",
                "Fingerprints tracked by the alert suppression cache"
            )
            .expect("Failed to register suppression_entries"),

            alerts_sent: register_int_gauge!(
                "pod_triage_alerts_sent_total",
                "Total alert notifications delivered"
            )
            .expect("Failed to register alerts_sent"),

            alerts_suppressed: register_int_gauge!(
                "pod_triage_alerts_suppressed_total",
                "Total alerts withheld by the suppression cache"
            )
            .expect("Failed to register alerts_suppressed"),

            diagnosis_failures: register_int_gauge!(
                "pod_triage_diagnosis_failures_total",
                "Total failed inference service requests"
            )
            .expect("Failed to register diagnosis_failures"),

            notification_failures: register_int_gauge!(
                "pod_triage_notification_failures_total",
                "Total failed notification sends"
            )
            .expect("Failed to register notification_failures"),

            cluster_errors: register_int_gauge!(
                "pod_triage_cluster_errors_total",
                "Total failed cluster queries"
            )
            .expect("Failed to register cluster_errors"),
        }
    }
}

/// Triage metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct TriageMetrics {
    _private: (),
}

impl Default for TriageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TriageMetrics {
    /// Create a metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(TriageMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &TriageMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_scan_latency(&self, duration_secs: f64) {
        self.inner().scan_latency_seconds.observe(duration_secs);
    }

    pub fn observe_diagnosis_latency(&self, duration_secs: f64) {
        self.inner()
            .diagnosis_latency_seconds
            .observe(duration_secs);
    }

    pub fn set_workloads_scanned(&self, count: i64) {
        self.inner().workloads_scanned.set(count);
    }

    pub fn set_suppression_entries(&self, count: i64) {
        self.inner().suppression_entries.set(count);
    }

    pub fn inc_alerts_sent(&self) {
        self.inner().alerts_sent.inc();
    }

    pub fn inc_alerts_suppressed(&self) {
        self.inner().alerts_suppressed.inc();
    }

    pub fn inc_diagnosis_failures(&self) {
        self.inner().diagnosis_failures.inc();
    }

    pub fn inc_notification_failures(&self) {
        self.inner().notification_failures.inc();
    }

    pub fn inc_cluster_errors(&self) {
        self.inner().cluster_errors.inc();
    }
}

/// Structured logger for triage events
///
/// Emits the significant lifecycle events as consistent JSON fields so
/// they can be queried downstream.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            "Triage agent started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Triage agent shutting down"
        );
    }

    pub fn log_scan_complete(&self, namespace: &str, workloads: usize, unhealthy: usize) {
        info!(
            event = "scan_complete",
            instance = %self.instance,
            namespace = %namespace,
            workloads = workloads,
            unhealthy = unhealthy,
            "Namespace scan complete"
        );
    }

    pub fn log_alert_sent(&self, pod: &str, namespace: &str, fingerprint: &str) {
        info!(
            event = "alert_sent",
            instance = %self.instance,
            pod = %pod,
            namespace = %namespace,
            fingerprint = %fingerprint,
            "Alert notification dispatched"
        );
    }

    pub fn log_alert_suppressed(
        &self,
        pod: &str,
        namespace: &str,
        fingerprint: &str,
        last_alerted_at: Option<i64>,
    ) {
        info!(
            event = "alert_suppressed",
            instance = %self.instance,
            pod = %pod,
            namespace = %namespace,
            fingerprint = %fingerprint,
            last_alerted_at = ?last_alerted_at,
            "Alert withheld; issue already reported"
        );
    }

    pub fn log_diagnosis_failure(&self, pod: &str, namespace: &str, error: &str) {
        warn!(
            event = "diagnosis_failed",
            instance = %self.instance,
            pod = %pod,
            namespace = %namespace,
            error = %error,
            "Diagnosis request failed; alert attempt abandoned"
        );
    }

    pub fn log_notification_failure(&self, pod: &str, namespace: &str, error: &str) {
        warn!(
            event = "notification_failed",
            instance = %self.instance,
            pod = %pod,
            namespace = %namespace,
            error = %error,
            "Notification send failed; alert attempt abandoned"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triage_metrics_creation() {
        // Metrics live in a process-global registry; this verifies the
        // handle can record without panicking.
        let metrics = TriageMetrics::new();

        metrics.observe_scan_latency(0.5);
        metrics.observe_diagnosis_latency(1.2);
        metrics.set_workloads_scanned(7);
        metrics.set_suppression_entries(3);
        metrics.inc_alerts_sent();
        metrics.inc_alerts_suppressed();
        metrics.inc_diagnosis_failures();
        metrics.inc_notification_failures();
        metrics.inc_cluster_errors();
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
