//! Diagnosis dispatch
//!
//! This module owns the per-workload alert pipeline:
//! classify → fingerprint → suppression claim → inference → notification,
//! plus the chat-completions client for the inference service.

mod dispatcher;
mod inference;

pub use dispatcher::DiagnosisDispatcher;
pub use inference::{AzureOpenAiConfig, AzureOpenAiInference, InferenceError, InferenceService};
