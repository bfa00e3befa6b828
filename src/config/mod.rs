//! Typed configuration from a TOML file.
//!
//! Loads once at startup and fails fast on a missing or malformed file.
//! A few environment variables override file values; SMTP credentials
//! only ever come from the environment (see [`secrets`]).

pub mod secrets;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::BacklogConfig;
use crate::error::{Error, Result};
use crate::model::{MAX_DELAY, delay_from_secs};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub backlog: BacklogSettings,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Variant-specific tables, passed through to the decision logic.
    #[serde(flatten)]
    pub variant: toml::Table,
    /// File this config was loaded from.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Decision logic variant tag.
    pub process_type: String,
    pub log_directory: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub otel_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Minimum epoch duration in seconds.
    pub sleep: f64,
    /// Absolute cap on complete items before a cleanup pass.
    pub max_complete: usize,
    /// Fraction of the queue allowed to be complete before a cleanup pass.
    pub max_frac: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            sleep: 0.1,
            max_complete: 100,
            max_frac: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BacklogSettings {
    pub warn_threshold: usize,
    /// Seconds between repeated warnings.
    pub warn_delay: f64,
    pub max_warn: u32,
    pub recipients: Vec<String>,
}

impl Default for BacklogSettings {
    fn default() -> Self {
        Self {
            warn_threshold: 1000,
            warn_delay: 3600.0,
            max_warn: 24,
            recipients: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub tls: Option<bool>,
    pub from: String,
}

impl Config {
    /// Load and validate the config file at `path`, then apply env
    /// overrides.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read config {}: {e}", path.display())))?;
        let mut config = Self::parse(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        config.path = Some(path.to_path_buf());
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse and validate config text without touching the environment.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| Error::Config(format!("bad config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.general.process_type.trim().is_empty() {
            return Err(Error::Config("general.process_type is empty".to_string()));
        }
        if delay_from_secs(self.queue.sleep).is_none() {
            return Err(Error::Config(format!(
                "queue.sleep must be between 0 and {} seconds, got {}",
                MAX_DELAY.num_seconds(),
                self.queue.sleep
            )));
        }
        if !(0.0..=1.0).contains(&self.queue.max_frac) {
            return Err(Error::Config(format!(
                "queue.max_frac must be within [0, 1], got {}",
                self.queue.max_frac
            )));
        }
        if delay_from_secs(self.backlog.warn_delay).is_none() {
            return Err(Error::Config(format!(
                "backlog.warn_delay must be between 0 and {} seconds, got {}",
                MAX_DELAY.num_seconds(),
                self.backlog.warn_delay
            )));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(level) = env_opt("IQUEUE_LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(endpoint) = env_opt("OTEL_ENDPOINT") {
            self.general.otel_endpoint = Some(endpoint);
        }
    }

    /// Config file stem, or `"inline"` for configs not read from disk.
    pub fn label(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "inline".to_string())
    }

    /// Log file path, when a log directory is configured.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.general.log_directory.as_ref().map(|dir| {
            dir.join(format!(
                "{}_{}.log",
                self.general.process_type,
                self.label()
            ))
        })
    }

    /// `queue.sleep` as a duration; zero if it is not a valid delay.
    pub fn min_epoch(&self) -> Duration {
        Duration::try_from_secs_f64(self.queue.sleep).unwrap_or(Duration::ZERO)
    }

    pub fn backlog_config(&self) -> BacklogConfig {
        BacklogConfig {
            warn_threshold: self.backlog.warn_threshold,
            warn_delay: delay_from_secs(self.backlog.warn_delay).unwrap_or(MAX_DELAY),
            max_warn: self.backlog.max_warn,
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            config = %self.path.as_deref().map(Path::display).map(|d| d.to_string()).unwrap_or_default(),
            process_type = %self.general.process_type,
            "config loaded"
        );
        tracing::info!(
            sleep = self.queue.sleep,
            max_complete = self.queue.max_complete,
            max_frac = self.queue.max_frac,
            "queue settings"
        );
        tracing::info!(
            warn_threshold = self.backlog.warn_threshold,
            warn_delay = self.backlog.warn_delay,
            max_warn = self.backlog.max_warn,
            recipients = self.backlog.recipients.len(),
            smtp = self.smtp.as_ref().map(|s| s.host.as_str()).unwrap_or("(none)"),
            "backlog settings"
        );
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}
