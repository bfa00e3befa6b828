//! Queue items: an ordered list of tasks plus completion state.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::queue::Scheduled;

use super::{ItemId, Task};

/// A unit of scheduled work.
///
/// `next_task` only ever increases, and `complete` holds exactly when it
/// has reached the end of `tasks`. An item with no tasks is complete from
/// the start.
#[derive(Debug, Clone)]
pub struct QueueItem {
    id: ItemId,
    created_at: DateTime<Utc>,
    tasks: Vec<Task>,
    next_task: usize,
    complete: bool,
    key: Option<String>,
    description: String,
}

impl QueueItem {
    pub fn new(created_at: DateTime<Utc>, tasks: Vec<Task>, description: impl Into<String>) -> Self {
        let complete = tasks.is_empty();
        Self {
            id: ItemId::new(),
            created_at,
            tasks,
            next_task: 0,
            complete,
            key: None,
            description: description.into(),
        }
    }

    /// Attach a partition key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn next_task(&self) -> usize {
        self.next_task
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// When the next task becomes eligible, or `None` once complete.
    ///
    /// A due time past the end of the calendar clamps to
    /// `DateTime::<Utc>::MAX_UTC`.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.tasks.get(self.next_task).map(|task| {
            self.created_at
                .checked_add_signed(task.delay())
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    /// True iff the next task is due at `now`.
    ///
    /// Complete items never expire; callers drain them before asking.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        debug_assert!(!self.complete, "has_expired on complete item {}", self.id);
        self.due_at().is_some_and(|due| now >= due)
    }

    /// Run the next task and advance.
    ///
    /// The item advances even when the action fails, so its state stays
    /// consistent; the action's error is handed back to the caller.
    pub fn execute(&mut self, now: DateTime<Utc>) -> Result<()> {
        let (Some(task), Some(due)) = (self.tasks.get(self.next_task), self.due_at()) else {
            return Err(Error::AlreadyComplete(self.id));
        };

        tracing::debug!(
            item = %self.id,
            task = self.next_task,
            action = task.action_name(),
            lag_ms = now.signed_duration_since(due).num_milliseconds(),
            "executing task"
        );
        let result = task.run();

        self.next_task += 1;
        self.complete = self.next_task == self.tasks.len();
        result
    }
}

impl Scheduled for QueueItem {
    fn due_at(&self) -> Option<DateTime<Utc>> {
        QueueItem::due_at(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FnAction;
    use chrono::TimeDelta;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(secs: i64, counter: Arc<AtomicUsize>) -> Task {
        Task::new(
            TimeDelta::seconds(secs),
            Arc::new(FnAction::new("count", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })),
            json!(null),
        )
    }

    #[test]
    fn two_task_item_walks_to_complete() {
        let t0 = Utc::now();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut item = QueueItem::new(
            t0,
            vec![
                counting_task(5, counter.clone()),
                counting_task(10, counter.clone()),
            ],
            "two steps",
        );

        assert_eq!(item.due_at(), Some(t0 + TimeDelta::seconds(5)));
        assert!(!item.has_expired(t0 + TimeDelta::seconds(4)));
        assert!(item.has_expired(t0 + TimeDelta::seconds(5)));

        item.execute(t0 + TimeDelta::seconds(5)).unwrap();
        assert!(!item.is_complete());
        assert_eq!(item.next_task(), 1);
        assert_eq!(item.due_at(), Some(t0 + TimeDelta::seconds(10)));

        item.execute(t0 + TimeDelta::seconds(10)).unwrap();
        assert!(item.is_complete());
        assert_eq!(item.due_at(), None);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        assert!(matches!(
            item.execute(t0 + TimeDelta::seconds(11)),
            Err(Error::AlreadyComplete(_))
        ));
    }

    #[test]
    fn failing_action_still_advances() {
        let t0 = Utc::now();
        let failing = Task::new(
            TimeDelta::zero(),
            Arc::new(FnAction::new("boom", |_| {
                Err(Error::Action {
                    action: "boom".to_string(),
                    message: "exploded".to_string(),
                })
            })),
            json!(null),
        );
        let mut item = QueueItem::new(t0, vec![failing], "fails");

        assert!(item.execute(t0).is_err());
        assert!(item.is_complete());
    }

    #[test]
    fn due_time_past_calendar_end_clamps() {
        let noop = Arc::new(FnAction::new("noop", |_| Ok(())));
        let tasks = vec![Task::new(TimeDelta::MAX, noop, json!(null))];
        let item = QueueItem::new(Utc::now(), tasks, "far future");

        assert_eq!(item.due_at(), Some(DateTime::<Utc>::MAX_UTC));
        assert!(!item.has_expired(Utc::now()));
    }

    #[test]
    fn empty_item_is_complete() {
        let item = QueueItem::new(Utc::now(), Vec::new(), "nothing to do");
        assert!(item.is_complete());
        assert_eq!(item.due_at(), None);
    }
}
