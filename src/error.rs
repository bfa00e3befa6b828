//! Error types for iqueue.

use thiserror::Error;

use crate::model::ItemId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("process_type={0} not understood")]
    UnknownProcessType(String),

    #[error("action {action} failed: {message}")]
    Action { action: String, message: String },

    #[error("decision logic failed: {0}")]
    Decision(String),

    #[error("item {0} is already complete")]
    AlreadyComplete(ItemId),

    /// The key's sub-queue front is not the item the main queue just popped.
    #[error("key index out of sync for key {key}: expected {expected}, found {found}")]
    IndexMismatch {
        key: String,
        expected: ItemId,
        found: ItemId,
    },

    #[error("key index has no entry for key {key} (item {item})")]
    IndexMissing { key: String, item: ItemId },

    #[error("alert source closed")]
    SourceClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors that mean the queue and key index disagree.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::IndexMismatch { .. } | Error::IndexMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
