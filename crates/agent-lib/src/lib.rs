//! Core library for the pod triage agent
//!
//! This crate provides the building blocks of the triage pipeline:
//! - Cluster inventory access over kubectl
//! - Health classification and issue fingerprinting
//! - TTL-based alert suppression
//! - Diagnosis dispatch against an inference service
//! - Email notification of operators
//! - Namespace scan orchestration
//! - Health checks and observability

pub mod cluster;
pub mod diagnose;
pub mod health;
pub mod models;
pub mod notify;
pub mod observability;
pub mod scanner;
pub mod triage;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{StructuredLogger, TriageMetrics};
