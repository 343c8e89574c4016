//! Core data models for pod triage

use serde::{Deserialize, Serialize};

/// Lifecycle phase reported for a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl WorkloadPhase {
    /// Parse a phase string as reported by the cluster. Anything
    /// unrecognized maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "Pending" => WorkloadPhase::Pending,
            "Running" => WorkloadPhase::Running,
            "Succeeded" => WorkloadPhase::Succeeded,
            "Failed" => WorkloadPhase::Failed,
            _ => WorkloadPhase::Unknown,
        }
    }

    /// Phases whose logs are worth inspecting. Everything else is still
    /// scheduling or in an indeterminate state.
    pub fn is_log_inspectable(&self) -> bool {
        matches!(
            self,
            WorkloadPhase::Running | WorkloadPhase::Succeeded | WorkloadPhase::Failed
        )
    }
}

impl std::fmt::Display for WorkloadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadPhase::Pending => write!(f, "Pending"),
            WorkloadPhase::Running => write!(f, "Running"),
            WorkloadPhase::Succeeded => write!(f, "Succeeded"),
            WorkloadPhase::Failed => write!(f, "Failed"),
            WorkloadPhase::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A container blocked from starting, with the reason reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingStatus {
    pub reason: String,
    /// May be empty; the cluster does not always attach a message
    pub message: String,
}

/// One poll's snapshot of a single workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadObservation {
    pub name: String,
    pub namespace: String,
    pub phase: WorkloadPhase,
    /// Restarts summed across constituent containers. Display-only;
    /// never a classification input.
    pub restart_count: u32,
    /// Present only when a container is blocked from starting
    pub waiting: Option<WaitingStatus>,
    /// Recent raw log output. `None` means the logs could not be
    /// retrieved (or were never fetched); `Some("")` means the workload
    /// has logs and they are empty.
    pub raw_log_tail: Option<String>,
    /// Full manifest text, supplied as extra diagnosis context
    pub manifest: Option<String>,
}

impl WorkloadObservation {
    /// True when the classifier would consult this workload's logs:
    /// a settled phase and no waiting container.
    pub fn is_log_inspectable(&self) -> bool {
        self.waiting.is_none() && self.phase.is_log_inspectable()
    }
}

/// Classifier output for one workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy,
    /// Error/exception lines found in the log tail, in original order
    ErrorInLogs { excerpt: Vec<String> },
    /// Workload blocked from (re)starting, or in an abnormal phase
    Blocked { reason: String, message: String },
    /// Logs not retrievable; the workload cannot be judged this scan
    Unknown,
}

/// Report-facing health state derived from a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Failing,
    Blocked,
    Unknown,
}

impl HealthState {
    /// Status glyph shown in reports
    pub fn icon(&self) -> &'static str {
        match self {
            HealthState::Ok => "✅",
            HealthState::Failing => "❌",
            HealthState::Blocked => "⏳",
            HealthState::Unknown => "❓",
        }
    }
}

/// Per-workload row of a scan report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub name: String,
    pub health: HealthState,
    pub icon: String,
    pub phase: WorkloadPhase,
    pub restarts: u32,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<DiagnosticRecord>,
}

/// Diagnostics entry for an unhealthy workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub name: String,
    /// Waiting reason/message for blocked workloads, the log excerpt for
    /// failing ones
    pub detail: String,
    /// Unix timestamp of the last alert sent for this issue, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alerted_at: Option<i64>,
    pub feedback: String,
}

/// Aggregated result of scanning one namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub namespace: String,
    /// Per-workload rows in cluster retrieval order
    pub workloads: Vec<WorkloadReport>,
    /// Unhealthy workloads only
    pub diagnostics: Vec<DiagnosticRecord>,
}

impl ScanReport {
    pub fn empty(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            workloads: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Aggregate counts for the cluster probe surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub namespaces: usize,
    pub workloads: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parse_known_values() {
        assert_eq!(WorkloadPhase::parse("Running"), WorkloadPhase::Running);
        assert_eq!(WorkloadPhase::parse("Pending"), WorkloadPhase::Pending);
        assert_eq!(WorkloadPhase::parse("Succeeded"), WorkloadPhase::Succeeded);
        assert_eq!(WorkloadPhase::parse("Failed"), WorkloadPhase::Failed);
    }

    #[test]
    fn test_phase_parse_unrecognized_is_unknown() {
        assert_eq!(WorkloadPhase::parse("Terminating"), WorkloadPhase::Unknown);
        assert_eq!(WorkloadPhase::parse(""), WorkloadPhase::Unknown);
    }

    #[test]
    fn test_log_inspectable_requires_settled_phase_and_no_waiting() {
        let mut obs = WorkloadObservation {
            name: "web-1".to_string(),
            namespace: "default".to_string(),
            phase: WorkloadPhase::Running,
            restart_count: 0,
            waiting: None,
            raw_log_tail: None,
            manifest: None,
        };
        assert!(obs.is_log_inspectable());

        obs.waiting = Some(WaitingStatus {
            reason: "CrashLoopBackOff".to_string(),
            message: String::new(),
        });
        assert!(!obs.is_log_inspectable());

        obs.waiting = None;
        obs.phase = WorkloadPhase::Pending;
        assert!(!obs.is_log_inspectable());
    }
}
