//! Namespace scan command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, ScanReport};
use crate::output::{color_phase, format_timestamp, print_warning, truncate, OutputFormat};

/// Row for the workload table
#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Pod Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Restarts")]
    restarts: u32,
    #[tabled(rename = "Feedback")]
    feedback: String,
}

/// Run a scan and render the aggregated report
pub async fn run(client: &ApiClient, namespace: Option<String>, format: OutputFormat) -> Result<()> {
    let path = match &namespace {
        Some(ns) => format!("dashboard/data?namespace={}", ns),
        None => "dashboard/data".to_string(),
    };
    let report: ScanReport = client.get(&path).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{}", "Workload Health".bold());
            println!("{}", "=".repeat(60));
            println!("Namespace: {}", report.namespace.cyan());
            println!();

            if report.workloads.is_empty() {
                print_warning("No workloads found in this namespace");
                return Ok(());
            }

            let rows: Vec<WorkloadRow> = report
                .workloads
                .iter()
                .map(|w| WorkloadRow {
                    name: w.name.clone(),
                    status: format!("{} {}", w.icon, color_phase(&w.phase)),
                    restarts: w.restarts,
                    feedback: truncate(&w.feedback, 60),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            if report.diagnostics.is_empty() {
                println!("\nNo errors detected in any pods.");
                return Ok(());
            }

            println!("\n{}", "Diagnostics".bold());
            println!("{}", "-".repeat(60));
            for diagnostic in &report.diagnostics {
                println!("{}", diagnostic.name.red().bold());
                println!("  Issue:      {}", truncate(&diagnostic.detail, 100));
                if let Some(ts) = diagnostic.last_alerted_at {
                    println!("  Last alert: {}", format_timestamp(ts));
                }
                println!("  Feedback:   {}", diagnostic.feedback);
                println!();
            }
            println!(
                "Total: {} workloads, {} with issues",
                report.workloads.len(),
                report.diagnostics.len()
            );
        }
    }

    Ok(())
}
