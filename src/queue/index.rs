//! Per-key sub-queues mirroring the main queue.
//!
//! Each key maps to a [`SortedQueue`] of lightweight entries, one per item
//! in the main queue carrying that key, in the same relative order. A key
//! is present only while its sub-queue is non-empty.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{ItemId, QueueItem};

use super::sorted::{Scheduled, SortedQueue};

/// The key index's view of one queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    id: ItemId,
    due: Option<DateTime<Utc>>,
}

impl IndexEntry {
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl From<&QueueItem> for IndexEntry {
    fn from(item: &QueueItem) -> Self {
        Self {
            id: item.id(),
            due: item.due_at(),
        }
    }
}

impl Scheduled for IndexEntry {
    fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due
    }
}

#[derive(Debug, Default)]
pub struct KeyIndex {
    by_key: HashMap<String, SortedQueue<IndexEntry>>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `item` under its key. Items without a key are ignored.
    pub fn register(&mut self, item: &QueueItem) {
        if let Some(key) = item.key() {
            self.by_key
                .entry(key.to_string())
                .or_default()
                .insert(IndexEntry::from(item));
        }
    }

    /// Drop `item` after it was popped complete from the main queue.
    ///
    /// The item must be at the front of its key's sub-queue.
    pub fn sync_on_completion(&mut self, item: &QueueItem) -> Result<()> {
        let Some(key) = item.key() else {
            return Ok(());
        };
        self.pop_matching(key, item.id())?;
        if self.by_key.get(key).is_some_and(SortedQueue::is_empty) {
            self.by_key.remove(key);
        }
        Ok(())
    }

    /// Reposition `item` after it went back into the main queue with a
    /// new due time.
    pub fn sync_on_reinsertion(&mut self, item: &QueueItem) -> Result<()> {
        let Some(key) = item.key() else {
            return Ok(());
        };
        self.pop_matching(key, item.id())?;
        self.by_key
            .entry(key.to_string())
            .or_default()
            .insert(IndexEntry::from(item));
        Ok(())
    }

    fn pop_matching(&mut self, key: &str, id: ItemId) -> Result<()> {
        let missing = || Error::IndexMissing {
            key: key.to_string(),
            item: id,
        };
        let queue = self.by_key.get_mut(key).ok_or_else(missing)?;
        match queue.peek_front().map(IndexEntry::id) {
            None => Err(missing()),
            Some(found) if found != id => Err(Error::IndexMismatch {
                key: key.to_string(),
                expected: id,
                found,
            }),
            Some(_) => {
                queue.pop_front();
                Ok(())
            }
        }
    }

    /// Remove the entry for `id` wherever it sits under `key`.
    ///
    /// Used when an item leaves the main queue other than through
    /// execution (drain, clean, explicit removal).
    pub fn forget(&mut self, id: ItemId, key: Option<&str>) -> bool {
        let Some(key) = key else {
            return false;
        };
        let Some(queue) = self.by_key.get_mut(key) else {
            return false;
        };
        let removed = !queue.remove_where(|entry| entry.id() == id).is_empty();
        if queue.is_empty() {
            self.by_key.remove(key);
        }
        removed
    }

    /// Drop every key whose sub-queue is empty. Returns how many went.
    pub fn sweep(&mut self) -> usize {
        let empty: Vec<String> = self
            .by_key
            .iter()
            .filter(|(_, queue)| queue.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &empty {
            self.by_key.remove(key);
        }
        empty.len()
    }

    /// Remove a key outright, returning the IDs it held in order.
    pub fn remove_key(&mut self, key: &str) -> Vec<ItemId> {
        self.by_key
            .remove(key)
            .map(|queue| queue.iter().map(IndexEntry::id).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&SortedQueue<IndexEntry>> {
        self.by_key.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// ID of the next item under `key` to become due.
    pub fn front(&self, key: &str) -> Option<ItemId> {
        self.by_key.get(key)?.peek_front().map(IndexEntry::id)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    /// Insert an empty sub-queue for `key`; only sweep cleans it up.
    #[cfg(test)]
    pub(crate) fn insert_empty(&mut self, key: &str) {
        self.by_key.entry(key.to_string()).or_default();
    }
}
