//! The `test` variant: print every alert a few times, keyed by `uid`.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Action, Alert, FnAction, MAX_DELAY, QueueItem, Task, delay_from_secs};

use super::{DecisionLogic, Schedule, command};

/// Default delays, in seconds after the alert, at which it is printed.
const DEFAULT_DELAYS: [f64; 2] = [5.0, 10.0];

pub struct SampleLogic {
    delays: Vec<f64>,
    print: Arc<dyn Action>,
}

impl SampleLogic {
    pub fn new(delays: Vec<f64>) -> Self {
        Self {
            delays,
            print: Arc::new(FnAction::new("print_alert", print_alert)),
        }
    }

    /// Read `[test] delays = [...]`, defaulting to 5s and 10s.
    pub fn from_params(params: &toml::Table) -> Result<Self> {
        let Some(raw) = params.get("test").and_then(|t| t.get("delays")) else {
            return Ok(Self::new(DEFAULT_DELAYS.to_vec()));
        };
        let array = raw
            .as_array()
            .ok_or_else(|| Error::Config("test.delays must be an array".to_string()))?;
        let delays = array
            .iter()
            .map(|v| -> Result<f64> {
                let secs = v
                    .as_float()
                    .or_else(|| v.as_integer().map(|i| i as f64))
                    .ok_or_else(|| Error::Config(format!("test.delays: {v} is not a number")))?;
                if delay_from_secs(secs).is_none() {
                    return Err(Error::Config(format!(
                        "test.delays: {secs} is not a delay between 0s and {}s",
                        MAX_DELAY.num_seconds()
                    )));
                }
                Ok(secs)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(delays))
    }

    pub fn delays(&self) -> &[f64] {
        &self.delays
    }
}

fn print_alert(args: &serde_json::Value) -> Result<()> {
    let graceid = args.get("graceid").and_then(|v| v.as_str()).unwrap_or("?");
    let alert = args.get("alert").cloned().unwrap_or_default();
    info!(graceid, %alert, "alert");
    Ok(())
}

impl DecisionLogic for SampleLogic {
    fn name(&self) -> &str {
        "test"
    }

    fn apply(
        &self,
        schedule: &mut Schedule<'_>,
        alert: &Alert,
        _params: &toml::Table,
    ) -> Result<()> {
        let graceid = alert
            .str_field("uid")
            .ok_or_else(|| Error::Decision("alert has no uid".to_string()))?;

        if graceid == command::COMMAND_UID {
            return command::apply(schedule, alert);
        }

        let args = json!({ "graceid": graceid, "alert": alert.payload });
        let tasks = self
            .delays
            .iter()
            .map(|&secs| Task::after_secs(secs, Arc::clone(&self.print), args.clone()))
            .collect::<Result<Vec<_>>>()?;
        let item = QueueItem::new(alert.timestamp, tasks, format!("print alert for {graceid}"))
            .with_key(graceid);

        debug!(item = %item.id(), graceid, tasks = self.delays.len(), "added queue item");
        schedule.insert(item);
        Ok(())
    }
}
