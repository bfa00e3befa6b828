//! In-memory scheduling containers: the due-time ordered queue and the
//! per-key index that mirrors it.

pub mod index;
pub mod sorted;

pub use index::{IndexEntry, KeyIndex};
pub use sorted::{Scheduled, SortedQueue};
