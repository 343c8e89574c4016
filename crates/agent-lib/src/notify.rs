//! Operator notification transport
//!
//! Alerts leave the system as plain-text email. The diagnosis text is the
//! notification body as-is; there is no separate formatting step.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

/// Errors raised while sending a notification. All recoverable: a failed
/// send is retried on the next scan cycle.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build mail message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Outbound notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// SMTP settings for the email notifier
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
    pub receiver: String,
}

/// Email notifier over implicit-TLS SMTP
pub struct SmtpNotifier {
    config: SmtpConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(config.sender.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self { config, mailer })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let from: Mailbox = self.config.sender.parse()?;
        let to: Mailbox = self.config.receiver.parse()?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        info!(
            to = %self.config.receiver,
            subject = subject,
            "Alert notification sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 465,
            sender: "agent@example.com".to_string(),
            password: "secret".to_string(),
            receiver: "oncall@example.com".to_string(),
        }
    }

    #[test]
    fn test_notifier_builds_without_connecting() {
        assert!(SmtpNotifier::new(config()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_sender_address_fails_before_transport() {
        let mut cfg = config();
        cfg.sender = "not an address".to_string();
        let notifier = SmtpNotifier::new(cfg).unwrap();

        let err = notifier.send("subject", "body").await.unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)));
    }
}
