//! Agent configuration
//!
//! Settings come from `TRIAGE_*` environment variables, with defaults
//! falling back to the conventional variable names for the external
//! services (AZURE_*, SMTP_*, EMAIL_*, KUBERNETES_NAMESPACE).

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use triage_lib::diagnose::AzureOpenAiConfig;
use triage_lib::notify::SmtpConfig;

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Namespace scanned when a request names none
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// API server port for the dashboard and probes
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Minimum interval between two alerts for the same issue
    #[serde(default = "default_alert_ttl")]
    pub alert_ttl_secs: i64,

    /// Concurrent per-workload dispatches within one scan
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,

    /// Request timeout against the inference service
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout_secs: u64,

    /// Azure OpenAI resource endpoint
    #[serde(default = "default_azure_endpoint")]
    pub azure_endpoint: String,

    #[serde(default = "default_azure_api_key")]
    pub azure_api_key: String,

    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,

    /// Deployment (model) name within the Azure resource
    #[serde(default = "default_azure_deployment")]
    pub azure_deployment: String,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default = "default_email_sender")]
    pub email_sender: String,

    #[serde(default = "default_email_password")]
    pub email_password: String,

    #[serde(default = "default_email_receiver")]
    pub email_receiver: String,
}

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| fallback.to_string())
}

fn default_namespace() -> String {
    env_or("KUBERNETES_NAMESPACE", "default")
}

fn default_api_port() -> u16 {
    8080
}

fn default_alert_ttl() -> i64 {
    3600
}

fn default_scan_concurrency() -> usize {
    8
}

fn default_inference_timeout() -> u64 {
    60
}

fn default_azure_endpoint() -> String {
    env_or("AZURE_API_BASE", "")
}

fn default_azure_api_key() -> String {
    env_or("AZURE_API_KEY", "")
}

fn default_azure_api_version() -> String {
    env_or("AZURE_API_VERSION", "")
}

fn default_azure_deployment() -> String {
    env_or("AZURE_DEPLOYMENT_MODEL", "")
}

fn default_smtp_host() -> String {
    env_or("SMTP_HOST", "smtp.gmail.com")
}

fn default_smtp_port() -> u16 {
    std::env::var("SMTP_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(465)
}

fn default_email_sender() -> String {
    env_or("EMAIL_SENDER", "")
}

fn default_email_password() -> String {
    env_or("EMAIL_PASSWORD", "")
}

fn default_email_receiver() -> String {
    env_or("EMAIL_RECEIVER", "")
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("TRIAGE"))
            .build()
            .context("Failed to read TRIAGE_* environment")?;

        config
            .try_deserialize()
            .context("Invalid TRIAGE_* configuration value")
    }

    /// Inference client settings derived from this configuration
    pub fn inference_config(&self) -> AzureOpenAiConfig {
        AzureOpenAiConfig {
            endpoint: self.azure_endpoint.clone(),
            api_key: self.azure_api_key.clone(),
            api_version: self.azure_api_version.clone(),
            deployment: self.azure_deployment.clone(),
            request_timeout: Duration::from_secs(self.inference_timeout_secs),
        }
    }

    /// SMTP notifier settings derived from this configuration
    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            sender: self.email_sender.clone(),
            password: self.email_password.clone(),
            receiver: self.email_receiver.clone(),
        }
    }
}
