//! Chat-completions client for the inference service
//!
//! The diagnosis itself is opaque to this system: a text context goes in,
//! free-text remediation advice comes out. Every failure mode here is
//! recoverable; the dispatcher abandons the alert attempt and retries on
//! a later scan.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// System prompt sent with every diagnosis request
const SYSTEM_PROMPT: &str = "You're a Kubernetes troubleshooting assistant.";

/// Errors raised by a diagnosis request
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("inference response contained no completion")]
    EmptyResponse,
}

/// External diagnosis service
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Produce free-text remediation advice for a diagnostic context
    async fn diagnose(&self, context: &str) -> Result<String, InferenceError>;
}

/// Connection settings for an Azure OpenAI chat-completions deployment
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    /// Deployment (model) name within the resource
    pub deployment: String,
    pub request_timeout: Duration,
}

/// Inference client against an Azure OpenAI deployment
pub struct AzureOpenAiInference {
    client: Client,
    api_key: String,
    completions_url: String,
}

impl AzureOpenAiInference {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let completions_url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint.trim_end_matches('/'),
            config.deployment,
            config.api_version
        );
        Ok(Self {
            client,
            api_key: config.api_key,
            completions_url,
        })
    }
}

#[async_trait]
impl InferenceService for AzureOpenAiInference {
    async fn diagnose(&self, context: &str) -> Result<String, InferenceError> {
        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: context,
                },
            ],
        };

        debug!(context_bytes = context.len(), "Requesting diagnosis");

        let response = self
            .client
            .post(&self.completions_url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(InferenceError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
