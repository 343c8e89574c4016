//! Health classification
//!
//! Assigns one workload observation to exactly one health verdict. A
//! waiting container (or an abnormal phase) takes priority over log
//! inspection; logs are only consulted for workloads in a settled phase.

use crate::models::{HealthVerdict, WorkloadObservation};

use super::excerpt::extract_error_lines;

/// Classify one workload observation.
///
/// Restart counts are deliberately not an input here: a workload that is
/// Running with clean logs is Healthy no matter how often it restarted.
pub fn classify(observation: &WorkloadObservation) -> HealthVerdict {
    if !observation.is_log_inspectable() {
        let (reason, message) = observation
            .waiting
            .as_ref()
            .map(|w| (w.reason.clone(), w.message.clone()))
            .unwrap_or_default();
        return HealthVerdict::Blocked { reason, message };
    }

    match &observation.raw_log_tail {
        None => HealthVerdict::Unknown,
        Some(raw) => {
            let excerpt = extract_error_lines(raw);
            if excerpt.is_empty() {
                HealthVerdict::Healthy
            } else {
                HealthVerdict::ErrorInLogs { excerpt }
            }
        }
    }
}
