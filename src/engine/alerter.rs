//! Backlog alerting with hysteresis.
//!
//! The alerter only decides; the dispatcher turns its decisions into
//! messages and sends them when recipients are configured.

use chrono::{DateTime, TimeDelta, Utc};

/// Thresholds for backlog warnings.
#[derive(Debug, Clone)]
pub struct BacklogConfig {
    /// Queue length above which the backlog is too long.
    pub warn_threshold: usize,
    /// Minimum spacing between repeated warnings.
    pub warn_delay: TimeDelta,
    /// Warnings sent before going silent until recovery.
    pub max_warn: u32,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            warn_threshold: 1000,
            warn_delay: TimeDelta::hours(1),
            max_warn: 24,
        }
    }
}

/// What a backlog check decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacklogEvent {
    /// Send warning number `count`; `last` marks the final one before
    /// silencing.
    Warning { count: u32, last: bool, len: usize },
    /// Still too long, but the warning cap has been reached.
    Silenced { len: usize },
    /// Queue is back under the threshold.
    Recovery { was_silenced: bool, len: usize },
}

/// `warn_count == 0` means normal; anything above is the warning state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertState {
    pub warn_count: u32,
    /// `None` stands for "any time".
    pub next_allowed: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct BacklogAlerter {
    config: BacklogConfig,
    state: AlertState,
}

impl BacklogAlerter {
    pub fn new(config: BacklogConfig) -> Self {
        Self {
            config,
            state: AlertState::default(),
        }
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn config(&self) -> &BacklogConfig {
        &self.config
    }

    /// Feed one observation of the queue length.
    pub fn check(&mut self, len: usize, now: DateTime<Utc>) -> Option<BacklogEvent> {
        if len > self.config.warn_threshold {
            if self.state.next_allowed.is_some_and(|next| now < next) {
                return None;
            }
            self.state.next_allowed = Some(
                now.checked_add_signed(self.config.warn_delay)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            );

            if self.state.warn_count >= self.config.max_warn {
                return Some(BacklogEvent::Silenced { len });
            }
            self.state.warn_count += 1;
            Some(BacklogEvent::Warning {
                count: self.state.warn_count,
                last: self.state.warn_count == self.config.max_warn,
                len,
            })
        } else if self.state.warn_count > 0 {
            let was_silenced = self.state.warn_count >= self.config.max_warn;
            self.state = AlertState::default();
            Some(BacklogEvent::Recovery { was_silenced, len })
        } else {
            None
        }
    }
}
