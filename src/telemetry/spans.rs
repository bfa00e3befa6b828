//! Span helpers for the dispatcher.
//!
//! The dispatcher span is the logging handle every component logs under;
//! item spans nest inside it while a task executes.

use tracing::Span;

use crate::model::QueueItem;

/// Root span for one dispatcher process.
pub fn dispatcher_span(process_type: &str, config: &str) -> Span {
    tracing::info_span!(
        "iqueue.dispatch",
        "queue.process_type" = process_type,
        "queue.config" = config,
    )
}

/// Span for executing the next task of `item`.
///
/// `item.complete` is declared empty and filled by [`record_item_progress`].
pub fn start_item_span(parent: &Span, item: &QueueItem) -> Span {
    tracing::info_span!(
        parent: parent,
        "queue.execute",
        "item.id" = %item.id(),
        "item.key" = item.key().unwrap_or("-"),
        "item.task" = item.next_task(),
        "item.tasks" = item.tasks().len(),
        "item.complete" = tracing::field::Empty,
    )
}

/// Record how far `item` has progressed on its span.
pub fn record_item_progress(span: &Span, item: &QueueItem) {
    span.record("item.complete", item.is_complete());
    span.in_scope(|| {
        tracing::debug!(
            next_task = item.next_task(),
            complete = item.is_complete(),
            "item advanced"
        );
    });
}
