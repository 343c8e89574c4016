//! Agent status command

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, ClusterHealth};
use crate::output::{print_error, OutputFormat};

/// Show agent liveness and aggregate cluster counts
pub async fn show(client: &ApiClient, format: OutputFormat) -> Result<()> {
    // /health returns 500 with an ERROR payload when the cluster is
    // unreachable; surface that as status output rather than a bare error
    let health: ClusterHealth = match client.get("health").await {
        Ok(health) => health,
        Err(err) => {
            print_error(&format!("Agent unreachable or cluster down: {err}"));
            return Ok(());
        }
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        OutputFormat::Table => {
            println!("{}", "Agent Status".bold());
            println!("{}", "=".repeat(40));
            let status = if health.status == "OK" {
                health.status.green().to_string()
            } else {
                health.status.red().to_string()
            };
            println!("Status:      {}", status);
            if let Some(namespaces) = health.namespaces {
                println!("Namespaces:  {}", namespaces);
            }
            if let Some(workloads) = health.workloads {
                println!("Workloads:   {}", workloads);
            }
            if let Some(details) = &health.details {
                println!("Details:     {}", details);
            }
        }
    }

    Ok(())
}
