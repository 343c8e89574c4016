//! Pod Triage CLI
//!
//! A command-line tool for scanning namespaces and checking the triage
//! agent's status from a terminal.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{namespaces, scan, status};

/// Pod Triage CLI
#[derive(Parser)]
#[command(name = "ptri")]
#[command(author, version, about = "CLI for the pod triage agent", long_about = None)]
pub struct Cli {
    /// Agent API endpoint URL (can also be set via PTRI_API_URL env var)
    #[arg(long, env = "PTRI_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List cluster namespaces
    Namespaces,

    /// Scan a namespace and report workload health
    Scan {
        /// Namespace to scan (agent default when omitted)
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Show agent liveness and aggregate cluster counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Namespaces => {
            namespaces::list(&client, cli.format).await?;
        }
        Commands::Scan { namespace } => {
            scan::run(&client, namespace, cli.format).await?;
        }
        Commands::Status => {
            status::show(&client, cli.format).await?;
        }
    }

    Ok(())
}
