//! Dispatcher: polls for alerts, routes them to decision logic, and runs
//! at most one due queue item per epoch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use tracing::{Instrument, Span, debug, error, info, warn};

use crate::config::Config;
use crate::decision::{DecisionLogic, Schedule};
use crate::error::Result;
use crate::identity::HostIdentity;
use crate::model::{ItemId, QueueItem, RawAlert};
use crate::notify::Notifier;
use crate::notify::messages::{self, Message, ReportContext};
use crate::queue::{KeyIndex, SortedQueue};
use crate::source::AlertSource;
use crate::telemetry::metrics;
use crate::telemetry::spans::{dispatcher_span, record_item_progress, start_item_span};

use super::alerter::{BacklogAlerter, BacklogConfig, BacklogEvent};

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Each epoch takes at least this long.
    pub min_epoch: Duration,
    /// Clean when more than this many complete items are queued...
    pub max_complete: usize,
    /// ...or when more than this fraction of the queue is complete,
    /// whichever is smaller.
    pub max_complete_fraction: f64,
    pub backlog: BacklogConfig,
    /// Notification recipients; empty disables sending.
    pub recipients: Vec<String>,
    /// Variant-specific parameters for the decision logic.
    pub params: toml::Table,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            min_epoch: Duration::from_millis(100),
            max_complete: 100,
            max_complete_fraction: 0.5,
            backlog: BacklogConfig::default(),
            recipients: Vec::new(),
            params: toml::Table::new(),
        }
    }
}

impl DispatcherConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_epoch: config.min_epoch(),
            max_complete: config.queue.max_complete,
            max_complete_fraction: config.queue.max_frac,
            backlog: config.backlog_config(),
            recipients: config.backlog.recipients.clone(),
            params: config.variant.clone(),
        }
    }
}

/// What one epoch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpochReport {
    /// An alert was taken from the source.
    pub received: bool,
    /// The alert failed to decode or the decision logic returned an error.
    pub rejected: bool,
    /// Complete items popped off the front before execution.
    pub drained: usize,
    pub executed: Option<ItemId>,
    /// The executed item ran its last task.
    pub completed: bool,
    pub action_failed: bool,
    /// Empty keys dropped from the key index.
    pub swept: usize,
    /// Complete items removed by a cleanup pass.
    pub cleaned: usize,
    pub backlog: Option<BacklogEvent>,
}

/// The single-threaded scheduling loop.
///
/// Owns the queue, the key index and the alert state; nothing else
/// touches them, so no locking is involved.
pub struct Dispatcher<S> {
    source: S,
    logic: Box<dyn DecisionLogic>,
    notifier: Arc<dyn Notifier>,
    config: DispatcherConfig,
    queue: SortedQueue<QueueItem>,
    index: KeyIndex,
    alerter: BacklogAlerter,
    report: ReportContext,
    span: Span,
}

impl<S: AlertSource> Dispatcher<S> {
    pub fn new(
        source: S,
        logic: Box<dyn DecisionLogic>,
        notifier: Arc<dyn Notifier>,
        config: DispatcherConfig,
    ) -> Self {
        let span = dispatcher_span(logic.name(), "inline");
        Self {
            source,
            logic,
            notifier,
            alerter: BacklogAlerter::new(config.backlog.clone()),
            config,
            queue: SortedQueue::new(),
            index: KeyIndex::new(),
            report: ReportContext {
                identity: HostIdentity::resolve(),
                config: "inline".to_string(),
            },
            span,
        }
    }

    /// Replace the host/config details used in notification text.
    pub fn with_report_context(mut self, report: ReportContext) -> Self {
        self.report = report;
        self
    }

    /// Log under `span` instead of the default dispatcher span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn queue(&self) -> &SortedQueue<QueueItem> {
        &self.queue
    }

    pub fn index(&self) -> &KeyIndex {
        &self.index
    }

    pub fn alerter(&self) -> &BacklogAlerter {
        &self.alerter
    }

    /// Direct access to the queue and index, as decision logic sees them.
    pub fn schedule(&mut self) -> Schedule<'_> {
        Schedule::new(&mut self.queue, &mut self.index)
    }

    /// Run epochs until an invariant violation stops the loop.
    ///
    /// There is no in-band shutdown; the process is expected to be
    /// terminated externally.
    pub async fn run(&mut self) -> Result<()> {
        self.span.in_scope(|| {
            info!(
                logic = self.logic.name(),
                min_epoch_ms = self.config.min_epoch.as_millis() as u64,
                "dispatcher started"
            )
        });

        loop {
            let started = Instant::now();
            self.run_epoch(Utc::now()).await?;

            let elapsed = started.elapsed();
            metrics::epoch_duration_ms().record(elapsed.as_secs_f64() * 1000.0, &[]);
            if let Some(wait) = self.config.min_epoch.checked_sub(elapsed) {
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Run one epoch as of `now`. Does not sleep.
    ///
    /// # Errors
    ///
    /// Only key index invariant violations are returned; every other
    /// failure is logged, reported and absorbed.
    pub async fn run_epoch(&mut self, now: DateTime<Utc>) -> Result<EpochReport> {
        let span = self.span.clone();
        let result = self.epoch(now).instrument(span).await;
        if let Err(ref e) = result {
            self.span
                .in_scope(|| error!(error = %e, "queue invariant violated, stopping"));
        }
        result
    }

    async fn epoch(&mut self, now: DateTime<Utc>) -> Result<EpochReport> {
        let mut report = EpochReport::default();

        // Receive only after poll says it won't block.
        if self.source.poll() {
            match self.source.receive().await {
                Ok(raw) => {
                    report.received = true;
                    metrics::alerts_received().add(1, &[]);
                    info!(body = %raw.body, timestamp = %raw.timestamp, "received alert");
                    report.rejected = !self.ingest(&raw).await;
                }
                Err(e) => warn!(error = %e, "alert source reported ready but receive failed"),
            }
        }

        while self.queue.peek_front().is_some_and(QueueItem::is_complete) {
            if let Some(item) = self.queue.pop_front() {
                debug!(item = %item.id(), description = item.description(), "already complete");
                self.index.forget(item.id(), item.key());
                report.drained += 1;
            }
        }

        if self.queue.peek_front().is_some_and(|item| item.has_expired(now)) {
            if let Some(item) = self.queue.pop_front() {
                self.execute(item, now, &mut report).await?;
            }
        }

        report.swept = self.index.sweep();

        let len = self.queue.len();
        let limit = f64::min(
            len as f64 * self.config.max_complete_fraction,
            self.config.max_complete as f64,
        );
        if self.queue.complete_count() as f64 > limit {
            let removed = self.queue.clean();
            for item in &removed {
                self.index.forget(item.id(), item.key());
            }
            report.cleaned = removed.len();
            metrics::queue_cleanups().add(1, &[]);
            debug!(removed = removed.len(), remaining = self.queue.len(), "cleaned queue");
        }

        let len = self.queue.len();
        if let Some(event) = self.alerter.check(len, now) {
            self.on_backlog(&event).await;
            report.backlog = Some(event);
        }
        metrics::queue_length().record(len as u64, &[]);

        Ok(report)
    }

    /// Decode `raw` and hand it to the decision logic. Returns false if
    /// the alert was dropped.
    async fn ingest(&mut self, raw: &RawAlert) -> bool {
        let (stage, err) = match raw.decode() {
            Err(e) => ("decode", e),
            Ok(alert) => {
                let mut schedule = Schedule::new(&mut self.queue, &mut self.index);
                match self.logic.apply(&mut schedule, &alert, &self.config.params) {
                    Ok(()) => return true,
                    Err(e) => ("decision", e),
                }
            }
        };

        warn!(
            stage,
            error = %err,
            body = %raw.body,
            timestamp = %raw.timestamp,
            "alert dropped"
        );
        metrics::alerts_rejected().add(1, &[KeyValue::new("stage", stage)]);
        let message = messages::decision_failure(
            &self.report,
            raw.timestamp,
            &raw.body,
            &format!("{stage}: {err}"),
        );
        self.notify(message).await;
        false
    }

    async fn execute(
        &mut self,
        mut item: QueueItem,
        now: DateTime<Utc>,
        report: &mut EpochReport,
    ) -> Result<()> {
        let span = start_item_span(&self.span, &item);
        let task = item.next_task();
        let result = span.in_scope(|| {
            info!(description = item.description(), "performing");
            item.execute(now)
        });
        record_item_progress(&span, &item);
        report.executed = Some(item.id());

        match result {
            Ok(()) => {
                metrics::tasks_executed().add(1, &[KeyValue::new("result", "ok")]);
            }
            Err(e) => {
                report.action_failed = true;
                metrics::tasks_executed().add(1, &[KeyValue::new("result", "error")]);
                span.in_scope(|| {
                    error!(
                        error = %e,
                        task,
                        description = item.description(),
                        "action failed"
                    )
                });
                let message =
                    messages::action_failure(&self.report, item.description(), task, &e.to_string());
                self.notify(message).await;
            }
        }

        if item.is_complete() {
            self.index.sync_on_completion(&item)?;
            metrics::items_completed().add(1, &[]);
            report.completed = true;
            span.in_scope(|| debug!("item complete"));
        } else {
            self.index.sync_on_reinsertion(&item)?;
            self.queue.insert(item);
        }
        Ok(())
    }

    async fn on_backlog(&self, event: &BacklogEvent) {
        let threshold = self.alerter.config().warn_threshold;
        let recipients = self.config.recipients.join(", ");
        match *event {
            BacklogEvent::Warning { count, last, len } => {
                metrics::backlog_notifications().add(1, &[KeyValue::new("kind", "warning")]);
                warn!(len, threshold, count, last, recipients = %recipients, "queue is too long");
                self.notify(messages::backlog_warning(&self.report, threshold, len, count, last))
                    .await;
            }
            BacklogEvent::Silenced { len } => {
                metrics::backlog_notifications().add(1, &[KeyValue::new("kind", "silenced")]);
                warn!(len, threshold, "queue is too long; warnings silenced until recovery");
            }
            BacklogEvent::Recovery { was_silenced, len } => {
                metrics::backlog_notifications().add(1, &[KeyValue::new("kind", "recovery")]);
                warn!(len, threshold, was_silenced, recipients = %recipients, "queue recovered");
                self.notify(messages::backlog_recovery(&self.report, threshold, len, was_silenced))
                    .await;
            }
        }
    }

    /// Send `message` to the configured recipients, if any. Delivery
    /// failures are logged and otherwise ignored.
    async fn notify(&self, message: Message) {
        if self.config.recipients.is_empty() {
            debug!(subject = %message.subject, "no recipients, notification not sent");
            return;
        }
        if let Err(e) = self
            .notifier
            .send(&self.config.recipients, &message.body, &message.subject)
            .await
        {
            warn!(
                channel = self.notifier.channel_name(),
                subject = %message.subject,
                error = %e,
                "notification delivery failed"
            );
        }
    }
}
