//! Control commands carried on the alert stream.
//!
//! An alert with `uid = "command"` is not an event but an instruction:
//! - `{"command": "print"}` logs the queue and key index
//! - `{"command": "remove", "graceid": K}` drops every item keyed `K`

use tracing::info;

use crate::error::{Error, Result};
use crate::model::Alert;

use super::Schedule;

/// `uid` value marking an alert as a command.
pub const COMMAND_UID: &str = "command";

pub fn apply(schedule: &mut Schedule<'_>, alert: &Alert) -> Result<()> {
    let command = alert
        .str_field("command")
        .ok_or_else(|| Error::Decision("command alert has no command".to_string()))?;

    match command {
        "print" => {
            print_snapshot(schedule);
            Ok(())
        }
        "remove" => {
            let graceid = alert
                .str_field("graceid")
                .ok_or_else(|| Error::Decision("remove command needs a graceid".to_string()))?;
            let removed = schedule.remove_key(graceid);
            info!(graceid, removed = removed.len(), "removed queue items");
            Ok(())
        }
        other => Err(Error::Decision(format!("command={other} not understood"))),
    }
}

fn print_snapshot(schedule: &Schedule<'_>) {
    let queue = schedule.queue();
    info!(
        len = queue.len(),
        complete = queue.complete_count(),
        keys = schedule.index().len(),
        "queue snapshot"
    );
    for key in schedule.index().keys() {
        let pending = schedule.index().get(key).map_or(0, |sub| sub.len());
        info!(key, pending, "indexed key");
    }
    for (pos, item) in queue.iter().enumerate() {
        info!(
            pos,
            item = %item.id(),
            key = item.key().unwrap_or("-"),
            due = %item.due_at().map(|d| d.to_rfc3339()).unwrap_or_else(|| "complete".to_string()),
            task = item.next_task(),
            tasks = item.tasks().len(),
            description = item.description(),
            "queued"
        );
    }
}
