//! Health triage for observed workloads
//!
//! This module provides:
//! - Log excerpt extraction (the bounded error tail of a log stream)
//! - Health classification of a workload observation
//! - Stable issue fingerprints for deduplication
//! - TTL-based alert suppression

mod classifier;
mod excerpt;
mod fingerprint;
mod suppress;

pub use classifier::classify;
pub use excerpt::{excerpt_text, extract_error_lines, MAX_EXCERPT_LINES};
pub use fingerprint::{blocked_fingerprint, log_fingerprint};
pub use suppress::{AlertSuppressor, DEFAULT_ALERT_TTL_SECS};
