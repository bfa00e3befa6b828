//! A single delayed action.

use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;

use crate::error::{Error, Result};

/// Longest delay accepted from configuration, one century.
pub const MAX_DELAY: TimeDelta = TimeDelta::days(36_525);

/// Convert fractional seconds to a delay in `[0, MAX_DELAY]`.
///
/// Returns `None` for NaN, infinities, negatives and anything longer
/// than [`MAX_DELAY`].
pub fn delay_from_secs(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let millis = (secs * 1000.0).round();
    if millis > MAX_DELAY.num_milliseconds() as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

/// Something a task does when it fires.
///
/// Actions run synchronously on the dispatch loop; a slow action stalls
/// scheduling for its duration.
pub trait Action: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &str;

    fn run(&self, args: &serde_json::Value) -> Result<()>;
}

/// Adapts a closure into an [`Action`].
pub struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn(&serde_json::Value) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&serde_json::Value) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, args: &serde_json::Value) -> Result<()> {
        (self.f)(args)
    }
}

/// An action scheduled at `delay` after its item's creation time.
#[derive(Clone)]
pub struct Task {
    delay: TimeDelta,
    action: Arc<dyn Action>,
    args: serde_json::Value,
}

impl Task {
    pub fn new(delay: TimeDelta, action: Arc<dyn Action>, args: serde_json::Value) -> Self {
        Self {
            delay,
            action,
            args,
        }
    }

    /// Build a task from a delay in (possibly fractional) seconds.
    ///
    /// # Errors
    ///
    /// `Error::Config` when `secs` is not a usable delay (see
    /// [`delay_from_secs`]).
    pub fn after_secs(secs: f64, action: Arc<dyn Action>, args: serde_json::Value) -> Result<Self> {
        let delay = delay_from_secs(secs)
            .ok_or_else(|| Error::Config(format!("delay {secs}s is out of range")))?;
        Ok(Self::new(delay, action, args))
    }

    pub fn delay(&self) -> TimeDelta {
        self.delay
    }

    pub fn action_name(&self) -> &str {
        self.action.name()
    }

    pub fn args(&self) -> &serde_json::Value {
        &self.args
    }

    pub(crate) fn run(&self) -> Result<()> {
        self.action.run(&self.args)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("delay", &self.delay)
            .field("action", &self.action.name())
            .field("args", &self.args)
            .finish()
    }
}
