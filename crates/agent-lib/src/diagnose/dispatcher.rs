//! Per-workload diagnosis dispatch
//!
//! One dispatch runs the whole alert pipeline for a single workload:
//! classify, fingerprint, consult the suppression cache, and, when the
//! issue is new or aged out, fetch a diagnosis and notify the operator.
//! Suppression state is only committed after the notification actually
//! went out, so a failed attempt is retried on the next scan instead of
//! being silently swallowed.

use std::sync::Arc;
use std::time::Instant;

use chrono::{TimeZone, Utc};

use crate::health::{components, HealthRegistry};
use crate::models::{
    DiagnosticRecord, HealthState, HealthVerdict, WorkloadObservation, WorkloadReport,
};
use crate::notify::Notifier;
use crate::observability::{StructuredLogger, TriageMetrics};
use crate::triage::{self, AlertSuppressor};

use super::inference::InferenceService;

/// Outcome of one alert attempt
struct AlertOutcome {
    feedback: String,
    last_alerted_at: Option<i64>,
}

/// Orchestrates classification, suppression, diagnosis, and notification
/// for individual workloads
pub struct DiagnosisDispatcher {
    inference: Arc<dyn InferenceService>,
    notifier: Arc<dyn Notifier>,
    suppressor: Arc<AlertSuppressor>,
    health: HealthRegistry,
    metrics: TriageMetrics,
    logger: StructuredLogger,
}

impl DiagnosisDispatcher {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        notifier: Arc<dyn Notifier>,
        suppressor: Arc<AlertSuppressor>,
        health: HealthRegistry,
        metrics: TriageMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            inference,
            notifier,
            suppressor,
            health,
            metrics,
            logger,
        }
    }

    pub fn suppressor(&self) -> &AlertSuppressor {
        &self.suppressor
    }

    /// Run the full pipeline for one observed workload and produce its
    /// report row. Never fails: every error is folded into the report.
    pub async fn dispatch(&self, observation: &WorkloadObservation) -> WorkloadReport {
        match triage::classify(observation) {
            HealthVerdict::Healthy => self.row(
                observation,
                HealthState::Ok,
                "No critical issues found.".to_string(),
                None,
            ),
            HealthVerdict::Unknown => self.row(
                observation,
                HealthState::Unknown,
                "Logs unavailable; health not determined this scan.".to_string(),
                None,
            ),
            HealthVerdict::Blocked { reason, message } => {
                let fingerprint =
                    triage::blocked_fingerprint(&observation.name, &reason, &message);
                let context = blocked_context(&reason, &message, observation.manifest.as_deref());
                let detail = format!("{reason}: {message}");
                let outcome = self.alert(observation, &fingerprint, &context).await;
                self.unhealthy_row(observation, HealthState::Blocked, detail, outcome)
            }
            HealthVerdict::ErrorInLogs { excerpt } => {
                let text = triage::excerpt_text(&excerpt);
                let fingerprint = triage::log_fingerprint(&text);
                let context = log_context(&text, observation.manifest.as_deref());
                let outcome = self.alert(observation, &fingerprint, &context).await;
                self.unhealthy_row(observation, HealthState::Failing, text, outcome)
            }
        }
    }

    /// Alert on one fingerprint unless it is suppressed. Side effects are
    /// strictly ordered: the suppression entry is committed only after
    /// the notification was delivered.
    async fn alert(
        &self,
        observation: &WorkloadObservation,
        fingerprint: &str,
        context: &str,
    ) -> AlertOutcome {
        let now = Utc::now().timestamp();

        if !self.suppressor.try_claim(fingerprint, now) {
            let last = self.suppressor.last_alerted_at(fingerprint);
            self.metrics.inc_alerts_suppressed();
            self.logger.log_alert_suppressed(
                &observation.name,
                &observation.namespace,
                fingerprint,
                last,
            );
            let feedback = match last {
                Some(ts) => format!(
                    "Issue previously reported. Last alert sent: {}",
                    format_timestamp(ts)
                ),
                None => "Issue alert already in progress.".to_string(),
            };
            return AlertOutcome {
                feedback,
                last_alerted_at: last,
            };
        }

        let started = Instant::now();
        let advice = match self.inference.diagnose(context).await {
            Ok(advice) => {
                self.health.set_healthy(components::INFERENCE).await;
                advice
            }
            Err(err) => {
                self.suppressor.release(fingerprint);
                self.metrics.inc_diagnosis_failures();
                self.health
                    .set_degraded(components::INFERENCE, err.to_string())
                    .await;
                self.logger.log_diagnosis_failure(
                    &observation.name,
                    &observation.namespace,
                    &err.to_string(),
                );
                return AlertOutcome {
                    feedback: format!("Diagnosis unavailable: {err}"),
                    last_alerted_at: self.suppressor.last_alerted_at(fingerprint),
                };
            }
        };
        self.metrics
            .observe_diagnosis_latency(started.elapsed().as_secs_f64());

        let subject = format!("Issue in pod {}", observation.name);
        if let Err(err) = self.notifier.send(&subject, &advice).await {
            self.suppressor.release(fingerprint);
            self.metrics.inc_notification_failures();
            self.health
                .set_degraded(components::NOTIFIER, err.to_string())
                .await;
            self.logger.log_notification_failure(
                &observation.name,
                &observation.namespace,
                &err.to_string(),
            );
            return AlertOutcome {
                feedback: format!("Notification failed: {err}"),
                last_alerted_at: self.suppressor.last_alerted_at(fingerprint),
            };
        }
        self.health.set_healthy(components::NOTIFIER).await;

        let sent_at = Utc::now().timestamp();
        self.suppressor.commit(fingerprint, sent_at);
        self.metrics.inc_alerts_sent();
        self.metrics
            .set_suppression_entries(self.suppressor.len() as i64);
        self.logger
            .log_alert_sent(&observation.name, &observation.namespace, fingerprint);

        AlertOutcome {
            feedback: advice,
            last_alerted_at: Some(sent_at),
        }
    }

    fn row(
        &self,
        observation: &WorkloadObservation,
        health: HealthState,
        feedback: String,
        diagnostic: Option<DiagnosticRecord>,
    ) -> WorkloadReport {
        WorkloadReport {
            name: observation.name.clone(),
            health,
            icon: health.icon().to_string(),
            phase: observation.phase,
            restarts: observation.restart_count,
            feedback,
            diagnostic,
        }
    }

    fn unhealthy_row(
        &self,
        observation: &WorkloadObservation,
        health: HealthState,
        detail: String,
        outcome: AlertOutcome,
    ) -> WorkloadReport {
        let diagnostic = DiagnosticRecord {
            name: observation.name.clone(),
            detail,
            last_alerted_at: outcome.last_alerted_at,
            feedback: outcome.feedback.clone(),
        };
        self.row(observation, health, outcome.feedback, Some(diagnostic))
    }
}

/// Diagnostic context for a blocked workload
fn blocked_context(reason: &str, message: &str, manifest: Option<&str>) -> String {
    let mut context = format!("Pod is failing with reason: {reason}\nMessage: {message}");
    if let Some(manifest) = manifest {
        context.push_str(&format!("\n\nPod manifest:\n{manifest}"));
    }
    context
}

/// Diagnostic context for a log-derived issue
fn log_context(excerpt: &str, manifest: Option<&str>) -> String {
    let mut context = format!("Analyze these logs and suggest fixes:\n{excerpt}");
    if let Some(manifest) = manifest {
        context.push_str(&format!("\n\nHere is the full pod manifest:\n{manifest}"));
    }
    context
}

fn format_timestamp(ts: i64) -> String {
    match Utc.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnose::inference::InferenceError;
    use crate::models::{WaitingStatus, WorkloadPhase};
    use crate::notify::NotifyError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct MockInference {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Option<Duration>,
    }

    impl MockInference {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: None,
            }
        }

        fn failing() -> Self {
            let mock = Self::new();
            mock.fail.store(true, Ordering::SeqCst);
            mock
        }

        fn slow(delay: Duration) -> Self {
            let mut mock = Self::new();
            mock.delay = Some(delay);
            mock
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceService for MockInference {
        async fn diagnose(&self, _context: &str) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                Err(InferenceError::EmptyResponse)
            } else {
                Ok("Restart the deployment with a fixed image tag.".to_string())
            }
        }
    }

    struct MockNotifier {
        calls: AtomicUsize,
        fail: AtomicBool,
        last: Mutex<Option<(String, String)>>,
    }

    impl MockNotifier {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                last: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            let mock = Self::new();
            mock.fail.store(true, Ordering::SeqCst);
            mock
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifyError::Address(
                    "bad@".parse::<lettre::Address>().unwrap_err(),
                ));
            }
            *self.last.lock().unwrap() = Some((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn dispatcher(
        inference: Arc<MockInference>,
        notifier: Arc<MockNotifier>,
    ) -> DiagnosisDispatcher {
        DiagnosisDispatcher::new(
            inference,
            notifier,
            Arc::new(AlertSuppressor::new()),
            HealthRegistry::new(),
            TriageMetrics::new(),
            StructuredLogger::new("test"),
        )
    }

    fn healthy_observation() -> WorkloadObservation {
        WorkloadObservation {
            name: "web-1".to_string(),
            namespace: "default".to_string(),
            phase: WorkloadPhase::Running,
            restart_count: 1,
            waiting: None,
            raw_log_tail: Some("listening on :8080".to_string()),
            manifest: None,
        }
    }

    fn blocked_observation() -> WorkloadObservation {
        WorkloadObservation {
            name: "web-1".to_string(),
            namespace: "default".to_string(),
            phase: WorkloadPhase::Pending,
            restart_count: 0,
            waiting: Some(WaitingStatus {
                reason: "ImagePullBackOff".to_string(),
                message: "rate limited".to_string(),
            }),
            raw_log_tail: None,
            manifest: Some("kind: Pod".to_string()),
        }
    }

    #[tokio::test]
    async fn test_healthy_workload_never_calls_services() {
        let inference = Arc::new(MockInference::new());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(inference.clone(), notifier.clone());

        let report = dispatcher.dispatch(&healthy_observation()).await;

        assert_eq!(report.health, HealthState::Ok);
        assert_eq!(report.feedback, "No critical issues found.");
        assert!(report.diagnostic.is_none());
        assert_eq!(inference.calls(), 0);
        assert_eq!(notifier.calls(), 0);
        assert!(dispatcher.suppressor().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_workload_is_informational_only() {
        let inference = Arc::new(MockInference::new());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(inference.clone(), notifier.clone());

        let mut obs = healthy_observation();
        obs.raw_log_tail = None;
        let report = dispatcher.dispatch(&obs).await;

        assert_eq!(report.health, HealthState::Unknown);
        assert!(report.diagnostic.is_none());
        assert_eq!(inference.calls(), 0);
        assert_eq!(notifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_blocked_workload_alerts_once_then_suppresses() {
        let inference = Arc::new(MockInference::new());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(inference.clone(), notifier.clone());
        let obs = blocked_observation();

        let first = dispatcher.dispatch(&obs).await;
        assert_eq!(first.health, HealthState::Blocked);
        assert_eq!(
            first.feedback,
            "Restart the deployment with a fixed image tag."
        );
        let diagnostic = first.diagnostic.unwrap();
        assert_eq!(diagnostic.detail, "ImagePullBackOff: rate limited");
        assert!(diagnostic.last_alerted_at.is_some());

        let (subject, body) = notifier.last.lock().unwrap().clone().unwrap();
        assert_eq!(subject, "Issue in pod web-1");
        assert_eq!(body, "Restart the deployment with a fixed image tag.");

        // Identical issue seconds later: no further service calls
        let second = dispatcher.dispatch(&obs).await;
        assert!(second.feedback.starts_with("Issue previously reported."));
        assert_eq!(inference.calls(), 1);
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_log_issue_excerpt_is_bounded_and_reported() {
        let inference = Arc::new(MockInference::new());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(inference.clone(), notifier.clone());

        let mut raw = String::new();
        for i in 0..150 {
            raw.push_str(&format!("Exception {i}\n"));
        }
        let mut obs = healthy_observation();
        obs.raw_log_tail = Some(raw);

        let report = dispatcher.dispatch(&obs).await;
        assert_eq!(report.health, HealthState::Failing);

        let diagnostic = report.diagnostic.unwrap();
        assert_eq!(diagnostic.detail.lines().count(), 100);
        assert!(diagnostic.detail.starts_with("Exception 50"));
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_inference_failure_leaves_no_suppression_entry() {
        let inference = Arc::new(MockInference::failing());
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = dispatcher(inference.clone(), notifier.clone());
        let obs = blocked_observation();

        let report = dispatcher.dispatch(&obs).await;
        assert!(report.feedback.starts_with("Diagnosis unavailable:"));
        assert_eq!(notifier.calls(), 0);
        assert!(dispatcher.suppressor().is_empty());

        // The same issue is re-attempted once inference recovers
        inference.fail.store(false, Ordering::SeqCst);
        let retry = dispatcher.dispatch(&obs).await;
        assert_eq!(
            retry.feedback,
            "Restart the deployment with a fixed image tag."
        );
        assert_eq!(inference.calls(), 2);
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_notification_failure_is_retried_next_scan() {
        let inference = Arc::new(MockInference::new());
        let notifier = Arc::new(MockNotifier::failing());
        let dispatcher = dispatcher(inference.clone(), notifier.clone());
        let obs = blocked_observation();

        let report = dispatcher.dispatch(&obs).await;
        assert!(report.feedback.starts_with("Notification failed:"));
        assert!(dispatcher.suppressor().is_empty());

        notifier.fail.store(false, Ordering::SeqCst);
        let retry = dispatcher.dispatch(&obs).await;
        assert_eq!(
            retry.feedback,
            "Restart the deployment with a fixed image tag."
        );
        assert_eq!(notifier.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_send_exactly_one_notification() {
        let inference = Arc::new(MockInference::slow(Duration::from_millis(20)));
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = Arc::new(dispatcher(inference.clone(), notifier.clone()));
        let obs = blocked_observation();

        let first = dispatcher.dispatch(&obs);
        let second = dispatcher.dispatch(&obs);
        let (a, b) = tokio::join!(first, second);

        assert_eq!(notifier.calls(), 1);
        let suppressed = [&a, &b]
            .iter()
            .filter(|report| {
                report.feedback.starts_with("Issue previously reported.")
                    || report.feedback == "Issue alert already in progress."
            })
            .count();
        assert_eq!(suppressed, 1);
    }

    #[test]
    fn test_blocked_context_includes_manifest_when_present() {
        let context = blocked_context("ImagePullBackOff", "rate limited", Some("kind: Pod"));
        assert!(context.starts_with("Pod is failing with reason: ImagePullBackOff"));
        assert!(context.contains("Message: rate limited"));
        assert!(context.ends_with("Pod manifest:\nkind: Pod"));

        let bare = blocked_context("ImagePullBackOff", "rate limited", None);
        assert!(!bare.contains("manifest"));
    }

    #[test]
    fn test_log_context_wraps_excerpt() {
        let context = log_context("ERROR: boom", None);
        assert_eq!(context, "Analyze these logs and suggest fixes:\nERROR: boom");
    }

    #[test]
    fn test_format_timestamp_renders_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }
}
