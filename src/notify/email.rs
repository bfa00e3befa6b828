//! SMTP email notifier via `lettre`.
//!
//! Port 465 uses implicit TLS, other ports STARTTLS unless TLS is turned
//! off, in which case the connection is plain.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::config::secrets::SmtpCredentials;

use super::{Notifier, NotifyError};

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from the `[smtp]` config table.
    ///
    /// When `credentials` is `None` the connection is unauthenticated.
    pub fn from_config(
        smtp: &SmtpConfig,
        credentials: Option<SmtpCredentials>,
    ) -> Result<Self, NotifyError> {
        let from: Mailbox = smtp
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let port = smtp.port.unwrap_or(587);
        let use_tls = smtp.tls.unwrap_or(true);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host).port(port)
        };

        if let Some(creds) = credentials {
            builder = builder.credentials(Credentials::new(
                creds.username,
                creds.password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_recipients(recipients: &[String]) -> Result<Vec<Mailbox>, NotifyError> {
    let mailboxes = recipients
        .iter()
        .map(|addr| {
            addr.parse()
                .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))
        })
        .collect::<Result<Vec<Mailbox>, _>>()?;

    if mailboxes.is_empty() {
        return Err(NotifyError::Config(
            "at least one recipient is required".to_string(),
        ));
    }
    Ok(mailboxes)
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(
        &self,
        recipients: &[String],
        body: &str,
        subject: &str,
    ) -> Result<(), NotifyError> {
        let mut message_builder = Message::builder().from(self.from.clone());
        let to = parse_recipients(recipients)?;
        for recipient in &to {
            message_builder = message_builder.to(recipient.clone());
        }

        let email = message_builder
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject,
            recipients = to.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
