//! Outbound notifications.
//!
//! This module provides:
//! - `Notifier` trait for pluggable delivery channels
//! - `EmailNotifier` (SMTP via lettre) and `LogNotifier` (log only)
//! - Message builders for backlog and failure reports

pub mod email;
pub mod messages;

use async_trait::async_trait;

pub use email::EmailNotifier;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Trait for notification channel implementations.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to every address in `recipients`.
    async fn send(&self, recipients: &[String], body: &str, subject: &str)
    -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "email", "log").
    fn channel_name(&self) -> &str;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipients: &[String],
        body: &str,
        subject: &str,
    ) -> Result<(), NotifyError> {
        tracing::warn!(
            channel = "log",
            recipients = %recipients.join(", "),
            subject,
            body,
            "notification (not delivered)"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
