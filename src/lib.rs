//! # iqueue
//!
//! A time-ordered, key-partitioned task queue fed by an alert stream.
//!
//! Alerts are routed through pluggable decision logic into multi-step
//! queue items. A single dispatch loop runs whichever item is due next,
//! keeps a per-key index in step with the main queue, and warns by email
//! when the backlog grows too long.

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod identity;
pub mod model;
pub mod notify;
pub mod queue;
pub mod source;
pub mod telemetry;
