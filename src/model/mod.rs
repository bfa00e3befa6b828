//! Core data model.
//!
//! A queue item is a sequence of delayed tasks created in response to one
//! alert. Each task fires at a fixed offset from the item's creation time;
//! the item is complete once its last task has run.

pub mod alert;
pub mod item;
pub mod task;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use alert::{Alert, RawAlert};
pub use item::QueueItem;
pub use task::{Action, FnAction, MAX_DELAY, Task, delay_from_secs};

// ---------------------------------------------------------------------------
// Item identity
// ---------------------------------------------------------------------------

/// Newtype for queue item IDs.
///
/// Items are owned by exactly one container at a time, so the key index
/// refers to them by ID rather than holding a second handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}
