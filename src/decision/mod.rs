//! Decision logic: turns an alert into queue items.
//!
//! The variant is chosen once at startup from `general.process_type`.
//! The set of variants is closed; an unknown tag is a startup error.

pub mod command;
pub mod sample;

use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Alert, QueueItem};
use crate::queue::{KeyIndex, SortedQueue};

pub use sample::SampleLogic;

/// Mutable access to the queue and its key index for decision logic.
///
/// [`Schedule::insert`] keeps both containers in step.
pub struct Schedule<'a> {
    queue: &'a mut SortedQueue<QueueItem>,
    index: &'a mut KeyIndex,
}

impl<'a> Schedule<'a> {
    pub fn new(queue: &'a mut SortedQueue<QueueItem>, index: &'a mut KeyIndex) -> Self {
        Self { queue, index }
    }

    /// Add an item to the queue and, if it has a key, to the index.
    pub fn insert(&mut self, item: QueueItem) {
        self.index.register(&item);
        self.queue.insert(item);
    }

    /// Remove every item carrying `key` from both containers.
    pub fn remove_key(&mut self, key: &str) -> Vec<QueueItem> {
        self.index.remove_key(key);
        self.queue.remove_where(|item| item.key() == Some(key))
    }

    pub fn queue(&self) -> &SortedQueue<QueueItem> {
        self.queue
    }

    pub fn index(&self) -> &KeyIndex {
        self.index
    }

    /// Raw access to the key index.
    ///
    /// Entries added here without a matching queue item are reported by
    /// the dispatcher as an invariant violation when that key next runs.
    pub fn index_mut(&mut self) -> &mut KeyIndex {
        self.index
    }
}

/// Trait for decision logic variants.
pub trait DecisionLogic: Send + Sync {
    fn name(&self) -> &str;

    /// React to one alert, inserting zero or more items.
    ///
    /// `params` holds the config tables not claimed by the dispatcher.
    fn apply(&self, schedule: &mut Schedule<'_>, alert: &Alert, params: &toml::Table)
    -> Result<()>;
}

/// Known decision logic variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessType {
    /// Prints each alert at a few fixed delays, keyed by its `uid`.
    Test,
    /// Logs each alert and schedules nothing.
    LogOnly,
}

impl ProcessType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessType::Test => "test",
            ProcessType::LogOnly => "log_only",
        }
    }

    /// Construct the logic for this variant, validating its parameters.
    pub fn build(self, params: &toml::Table) -> Result<Box<dyn DecisionLogic>> {
        match self {
            ProcessType::Test => Ok(Box::new(SampleLogic::from_params(params)?)),
            ProcessType::LogOnly => Ok(Box::new(LogOnlyLogic)),
        }
    }
}

impl FromStr for ProcessType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "test" => Ok(ProcessType::Test),
            "log_only" => Ok(ProcessType::LogOnly),
            other => Err(Error::UnknownProcessType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Records alerts without scheduling anything.
#[derive(Debug, Default)]
pub struct LogOnlyLogic;

impl DecisionLogic for LogOnlyLogic {
    fn name(&self) -> &str {
        "log_only"
    }

    fn apply(
        &self,
        _schedule: &mut Schedule<'_>,
        alert: &Alert,
        _params: &toml::Table,
    ) -> Result<()> {
        info!(
            timestamp = %alert.timestamp,
            payload = %alert.payload,
            "alert logged"
        );
        Ok(())
    }
}
