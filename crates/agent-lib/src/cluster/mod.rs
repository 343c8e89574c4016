//! Cluster inventory access
//!
//! Everything the agent knows about the cluster arrives through the
//! [`ClusterQuery`] trait: namespace and workload listings, raw logs, and
//! manifests. The production implementation shells out to `kubectl`;
//! tests substitute in-memory doubles.

mod kubectl;

pub use kubectl::KubectlCluster;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::WorkloadObservation;

/// Errors raised by cluster queries. All of them are recoverable: callers
/// degrade to empty results or skip the affected workload.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to parse `{command}` output: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only view of the cluster inventory
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// All namespace names in the cluster
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError>;

    /// Status snapshots of every workload in a namespace, in cluster
    /// retrieval order. Log tails and manifests are not populated here;
    /// they are fetched separately per workload.
    async fn list_workloads(&self, namespace: &str)
        -> Result<Vec<WorkloadObservation>, ClusterError>;

    /// Raw recent log output of one workload
    async fn get_logs(&self, name: &str, namespace: &str) -> Result<String, ClusterError>;

    /// Full manifest text of one workload
    async fn get_manifest(&self, name: &str, namespace: &str) -> Result<String, ClusterError>;
}
