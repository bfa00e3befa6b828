//! Metric instrument factories for iqueue.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"iqueue"` meter; without
//! an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};

/// Returns the shared meter for iqueue instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("iqueue")
}

/// Counter: alerts received from the source.
pub fn alerts_received() -> Counter<u64> {
    meter()
        .u64_counter("iqueue.alerts.received")
        .with_description("Number of alerts received")
        .build()
}

/// Counter: alerts dropped because decoding or decision logic failed.
/// Labels: `stage` ("decode" | "decision").
pub fn alerts_rejected() -> Counter<u64> {
    meter()
        .u64_counter("iqueue.alerts.rejected")
        .with_description("Number of alerts dropped after a failure")
        .build()
}

/// Counter: tasks executed.
/// Labels: `result` ("ok" | "error").
pub fn tasks_executed() -> Counter<u64> {
    meter()
        .u64_counter("iqueue.tasks.executed")
        .with_description("Number of tasks executed")
        .build()
}

/// Counter: queue items that ran their last task.
pub fn items_completed() -> Counter<u64> {
    meter()
        .u64_counter("iqueue.items.completed")
        .with_description("Number of queue items completed")
        .build()
}

/// Counter: full cleanup passes over the queue.
pub fn queue_cleanups() -> Counter<u64> {
    meter()
        .u64_counter("iqueue.queue.cleanups")
        .with_description("Number of cleanup passes removing complete items")
        .build()
}

/// Counter: backlog notifications.
/// Labels: `kind` ("warning" | "silenced" | "recovery").
pub fn backlog_notifications() -> Counter<u64> {
    meter()
        .u64_counter("iqueue.backlog.notifications")
        .with_description("Number of backlog state notifications")
        .build()
}

/// Gauge: queue length at the end of an epoch.
pub fn queue_length() -> Gauge<u64> {
    meter()
        .u64_gauge("iqueue.queue.length")
        .with_description("Number of items in the queue")
        .build()
}

/// Histogram: epoch duration in milliseconds, before sleeping.
pub fn epoch_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("iqueue.epoch.duration_ms")
        .with_description("Dispatcher epoch duration in milliseconds")
        .with_unit("ms")
        .build()
}
