//! Secret handling.
//!
//! SMTP credentials are read from the environment and kept wrapped in
//! [`SecretString`] so they never end up in logs.

pub use secrecy::{ExposeSecret, SecretString};

/// Login for the SMTP relay.
#[derive(Debug)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: SecretString,
}

impl SmtpCredentials {
    /// `SMTP_USERNAME` and `SMTP_PASSWORD`, when both are set.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("SMTP_USERNAME").ok()?;
        let password = std::env::var("SMTP_PASSWORD").ok()?;
        Some(Self {
            username,
            password: SecretString::from(password),
        })
    }
}
