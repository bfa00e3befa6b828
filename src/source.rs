//! Alert sources.
//!
//! The dispatcher polls its source without blocking and only receives
//! after a successful poll, so `receive` is expected to return promptly.

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::RawAlert;

#[async_trait]
pub trait AlertSource: Send {
    /// True iff `receive` would not block.
    fn poll(&mut self) -> bool;

    async fn receive(&mut self) -> Result<RawAlert>;
}

/// Source backed by an unbounded tokio channel.
pub struct ChannelSource {
    rx: UnboundedReceiver<RawAlert>,
    /// Message taken off the channel by `poll`, handed out by `receive`.
    pending: Option<RawAlert>,
}

impl ChannelSource {
    pub fn new(rx: UnboundedReceiver<RawAlert>) -> Self {
        Self { rx, pending: None }
    }

    /// Create a source together with the sender feeding it.
    pub fn channel() -> (UnboundedSender<RawAlert>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl AlertSource for ChannelSource {
    fn poll(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(alert) => {
                self.pending = Some(alert);
                true
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    async fn receive(&mut self) -> Result<RawAlert> {
        if let Some(alert) = self.pending.take() {
            return Ok(alert);
        }
        self.rx.recv().await.ok_or(Error::SourceClosed)
    }
}

/// Read newline-delimited alert payloads from `reader` on a background
/// task, stamping each with its arrival time.
///
/// Blank lines are skipped. The task ends at EOF or on a read error; the
/// returned source then simply stops producing alerts.
pub fn spawn_line_reader<R>(reader: R) -> ChannelSource
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, source) = ChannelSource::channel();
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(RawAlert::new(line, Utc::now())).is_err() {
                        debug!("alert receiver dropped, stopping reader");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("alert input reached EOF");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read alert input");
                    break;
                }
            }
        }
    });
    source
}
