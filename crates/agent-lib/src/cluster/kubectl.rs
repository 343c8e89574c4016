//! kubectl-backed cluster queries
//!
//! Runs `kubectl` as a subprocess and parses its JSON output into the
//! narrow slice of pod status this system needs. Output decoding is lossy
//! UTF-8 since log streams routinely carry invalid bytes.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::models::{WaitingStatus, WorkloadObservation, WorkloadPhase};

use super::{ClusterError, ClusterQuery};

/// Cluster query implementation backed by the `kubectl` binary
pub struct KubectlCluster {
    binary: String,
}

impl Default for KubectlCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl KubectlCluster {
    pub fn new() -> Self {
        Self::with_binary("kubectl")
    }

    /// Use a non-default kubectl binary (tests point this at a stub)
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ClusterError> {
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %command, "Running cluster query");

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|source| ClusterError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ClusterQuery for KubectlCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>, ClusterError> {
        let stdout = self.run(&["get", "namespaces", "-o", "json"]).await?;
        let list: ObjectList<NamedObject> =
            serde_json::from_str(&stdout).map_err(|source| ClusterError::Parse {
                command: format!("{} get namespaces", self.binary),
                source,
            })?;
        Ok(list.items.into_iter().map(|ns| ns.metadata.name).collect())
    }

    async fn list_workloads(
        &self,
        namespace: &str,
    ) -> Result<Vec<WorkloadObservation>, ClusterError> {
        let stdout = self
            .run(&["get", "pods", "-n", namespace, "-o", "json"])
            .await?;
        let list: ObjectList<PodItem> =
            serde_json::from_str(&stdout).map_err(|source| ClusterError::Parse {
                command: format!("{} get pods -n {namespace}", self.binary),
                source,
            })?;
        Ok(list
            .items
            .into_iter()
            .map(|item| item.into_observation(namespace))
            .collect())
    }

    async fn get_logs(&self, name: &str, namespace: &str) -> Result<String, ClusterError> {
        self.run(&["logs", name, "-n", namespace]).await
    }

    async fn get_manifest(&self, name: &str, namespace: &str) -> Result<String, ClusterError> {
        self.run(&["get", "pod", name, "-n", namespace, "-o", "yaml"])
            .await
    }
}

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PodItem {
    metadata: ObjectMeta,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatus {
    phase: Option<String>,
    #[serde(default)]
    container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerStatus {
    #[serde(default)]
    restart_count: u32,
    #[serde(default)]
    state: ContainerState,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerState {
    waiting: Option<WaitingDetail>,
}

#[derive(Debug, Deserialize)]
struct WaitingDetail {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

impl PodItem {
    /// Reduce a pod status payload to a workload observation. Restarts
    /// are summed across containers; the first waiting container wins.
    fn into_observation(self, namespace: &str) -> WorkloadObservation {
        let phase = self
            .status
            .phase
            .as_deref()
            .map(WorkloadPhase::parse)
            .unwrap_or(WorkloadPhase::Unknown);
        let restart_count = self
            .status
            .container_statuses
            .iter()
            .map(|c| c.restart_count)
            .sum();
        let waiting = self
            .status
            .container_statuses
            .into_iter()
            .find_map(|c| c.state.waiting)
            .map(|w| WaitingStatus {
                reason: w.reason,
                message: w.message,
            });

        WorkloadObservation {
            name: self.metadata.name,
            namespace: namespace.to_string(),
            phase,
            restart_count,
            waiting,
            raw_log_tail: None,
            manifest: None,
        }
    }
}
