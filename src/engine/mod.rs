//! Dispatch engine: the epoch loop and backlog alerting.

pub mod alerter;
pub mod dispatcher;

pub use alerter::{AlertState, BacklogAlerter, BacklogConfig, BacklogEvent};
pub use dispatcher::{Dispatcher, DispatcherConfig, EpochReport};
