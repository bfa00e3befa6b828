//! Subject and body text for the notifications the dispatcher sends.

use chrono::{DateTime, Local, Utc};

use crate::identity::HostIdentity;

/// Facts appended to every message so the reader can find the process.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub identity: HostIdentity,
    /// Config file the process was started with, as given.
    pub config: String,
}

impl ReportContext {
    fn footer(&self) -> String {
        format!(
            "    username : {}\n    hostname : {}\n    config   : {}\n",
            self.identity.username, self.identity.hostname, self.config
        )
    }
}

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

pub fn backlog_warning(
    ctx: &ReportContext,
    threshold: usize,
    len: usize,
    count: u32,
    last: bool,
) -> Message {
    let mut subject = format!("WARNING: queue is too long on {}", ctx.identity.hostname);
    let mut body = format!(
        "WARNING:\ndispatcher holds a queue with more than {threshold} elements (len(queue)={len})\n{}This is warning number : {count}\n",
        ctx.footer()
    );
    if last {
        subject = format!("FINAL {subject}");
        body.push_str("This is the final warning!");
    }
    Message { subject, body }
}

pub fn backlog_recovery(
    ctx: &ReportContext,
    threshold: usize,
    len: usize,
    was_silenced: bool,
) -> Message {
    let subject = format!("RECOVERY: queue has shortened on {}", ctx.identity.hostname);
    let mut body = format!(
        "RECOVERY:\ndispatcher holds a queue with no more than {threshold} elements (len(queue)={len})\n{}",
        ctx.footer()
    );
    if was_silenced {
        body.push_str("Recovery has un-silenced warnings.");
    }
    Message { subject, body }
}

/// The decision logic rejected (or could not decode) an alert.
pub fn decision_failure(
    ctx: &ReportContext,
    received_at: DateTime<Utc>,
    alert: &str,
    error: &str,
) -> Message {
    Message {
        subject: format!(
            "WARNING: decision logic caught an exception on {}",
            ctx.identity.hostname
        ),
        body: format!(
            "time (localtime): \n  {}\n\nalert message: \n  {alert}\n\n{error}\n\n{}",
            received_at.with_timezone(&Local).to_rfc2822(),
            ctx.footer()
        ),
    }
}

/// A task's action returned an error.
pub fn action_failure(
    ctx: &ReportContext,
    description: &str,
    task: usize,
    error: &str,
) -> Message {
    Message {
        subject: format!("WARNING: queue item action failed on {}", ctx.identity.hostname),
        body: format!(
            "item : {description}\ntask : {task}\n\n{error}\n\n{}",
            ctx.footer()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ReportContext {
        ReportContext {
            identity: HostIdentity {
                hostname: "node1".into(),
                username: "ops".into(),
            },
            config: "iq.toml".into(),
        }
    }

    #[test]
    fn final_warning_is_marked() {
        let msg = backlog_warning(&ctx(), 3, 4, 2, true);
        assert!(msg.subject.starts_with("FINAL WARNING"));
        assert!(msg.body.ends_with("This is the final warning!"));
        assert!(msg.body.contains("hostname : node1"));
    }

    #[test]
    fn ordinary_warning_is_not_final() {
        let msg = backlog_warning(&ctx(), 3, 4, 1, false);
        assert!(msg.subject.starts_with("WARNING"));
        assert!(msg.body.contains("warning number : 1"));
        assert!(!msg.body.contains("final"));
    }

    #[test]
    fn recovery_mentions_unsilencing_only_when_silenced() {
        assert!(
            backlog_recovery(&ctx(), 3, 2, true)
                .body
                .contains("un-silenced")
        );
        assert!(
            !backlog_recovery(&ctx(), 3, 2, false)
                .body
                .contains("un-silenced")
        );
    }
}
