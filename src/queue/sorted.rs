//! A queue kept in ascending order of next due time.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Anything that can sit in a [`SortedQueue`].
pub trait Scheduled {
    /// When this entry next becomes due; `None` once it is complete.
    fn due_at(&self) -> Option<DateTime<Utc>>;

    fn is_complete(&self) -> bool {
        self.due_at().is_none()
    }
}

/// `a` may stand before `b`. Complete entries (`None`) sort last.
fn not_after(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> bool {
    match (a, b) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a <= b,
    }
}

/// Entries ordered by due time, earliest first.
///
/// Entries with equal due times keep their insertion order. The number of
/// complete entries is tracked on insert and removal so backlog checks
/// never need a scan.
#[derive(Debug)]
pub struct SortedQueue<T> {
    items: VecDeque<T>,
    complete: usize,
}

impl<T> Default for SortedQueue<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            complete: 0,
        }
    }
}

impl<T: Scheduled> SortedQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert after every entry due no later than `item`.
    pub fn insert(&mut self, item: T) {
        let due = item.due_at();
        let pos = self.items.partition_point(|existing| not_after(existing.due_at(), due));
        if item.is_complete() {
            self.complete += 1;
        }
        self.items.insert(pos, item);
        debug_assert!(self.is_ordered());
    }

    pub fn peek_front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        if item.is_complete() {
            self.complete -= 1;
        }
        Some(item)
    }

    /// Number of entries currently flagged complete.
    pub fn complete_count(&self) -> usize {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Remove every complete entry wherever it sits.
    ///
    /// Entries normally leave from the front, so a complete entry stuck
    /// behind a pending one is only reclaimed here.
    pub fn clean(&mut self) -> Vec<T> {
        self.remove_where(|item| item.is_complete())
    }

    /// Remove every entry matching `pred`, keeping the rest in order.
    pub fn remove_where<P>(&mut self, mut pred: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if pred(&item) {
                removed.push(item);
            } else {
                kept.push_back(item);
            }
        }
        self.items = kept;
        self.complete -= removed.iter().filter(|item| item.is_complete()).count();
        removed
    }

    /// Every adjacent pair is in due-time order.
    pub fn is_ordered(&self) -> bool {
        self.items
            .iter()
            .zip(self.items.iter().skip(1))
            .all(|(a, b)| not_after(a.due_at(), b.due_at()))
    }
}
