//! Namespace listing command

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::OutputFormat;

/// List cluster namespaces known to the agent
pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let names: Vec<String> = client.get("dashboard/namespaces").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
        OutputFormat::Table => {
            if names.is_empty() {
                println!("{}", "No namespaces found".yellow());
                return Ok(());
            }
            for name in &names {
                println!("{}", name);
            }
            println!("\nTotal: {} namespaces", names.len());
        }
    }

    Ok(())
}
