use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use iqueue::config::Config;
use iqueue::config::secrets::{ExposeSecret, SmtpCredentials};
use iqueue::error::Error;

const MINIMAL: &str = r#"
[general]
process_type = "test"
"#;

#[test]
fn minimal_config_gets_defaults() {
    let config = Config::parse(MINIMAL).unwrap();

    assert_eq!(config.general.process_type, "test");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.min_epoch(), Duration::from_millis(100));
    assert_eq!(config.queue.max_complete, 100);
    assert_eq!(config.queue.max_frac, 0.5);
    assert_eq!(config.backlog.warn_threshold, 1000);
    assert_eq!(config.backlog.max_warn, 24);
    assert!(config.backlog.recipients.is_empty());
    assert!(config.smtp.is_none());
    assert_eq!(config.backlog_config().warn_delay, TimeDelta::hours(1));
    assert_eq!(config.label(), "inline");
    assert_eq!(config.log_file(), None);
}

#[test]
fn full_config_is_read_and_variant_tables_pass_through() {
    let config = Config::parse(
        r#"
[general]
process_type = "test"
log_directory = "/var/log/iqueue"
log_level = "debug"

[queue]
sleep = 0.5
max_complete = 10
max_frac = 0.25

[backlog]
warn_threshold = 50
warn_delay = 1.5
max_warn = 3
recipients = ["a@example.com", "b@example.com"]

[smtp]
host = "smtp.example.com"
port = 587
from = "iqueue@example.com"

[test]
delays = [1, 2]
"#,
    )
    .unwrap();

    assert_eq!(config.min_epoch(), Duration::from_millis(500));
    assert_eq!(config.backlog_config().warn_delay, TimeDelta::milliseconds(1_500));
    assert_eq!(config.backlog.recipients.len(), 2);
    assert_eq!(config.smtp.as_ref().unwrap().port, Some(587));
    assert!(config.variant.contains_key("test"));
    assert!(!config.variant.contains_key("general"));
    assert_eq!(
        config.log_file(),
        Some(PathBuf::from("/var/log/iqueue/test_inline.log"))
    );
}

#[test]
fn invalid_values_are_rejected() {
    for bad in [
        "[general]\nprocess_type = \"\"\n",
        "[general]\nprocess_type = \"test\"\n[queue]\nmax_frac = 1.5\n",
        "[general]\nprocess_type = \"test\"\n[queue]\nsleep = -1.0\n",
        "[general]\nprocess_type = \"test\"\n[backlog]\nwarn_delay = -5.0\n",
        "[general]\nprocess_type = \"test\"\n[backlog]\nwarn_delay = 1e15\n",
        "[general]\nprocess_type = \"test\"\n[backlog]\nwarn_delay = inf\n",
        "[general]\nprocess_type = \"test\"\n[queue]\nsleep = 1e20\n",
        "[general]\nprocess_type = \"test\"\n[queue]\nsleep = nan\n",
        "[queue]\nsleep = 1.0\n",
        "not toml at all [",
    ] {
        let result = Config::parse(bad);
        assert!(
            matches!(result, Err(Error::Config(_))),
            "accepted: {bad:?}"
        );
    }
}

#[test]
fn longest_accepted_delays_convert_without_overflow() {
    let config = Config::parse(
        "[general]\nprocess_type = \"test\"\n[queue]\nsleep = 3155760000.0\n[backlog]\nwarn_delay = 3155760000.0\n",
    )
    .unwrap();

    assert_eq!(config.min_epoch(), Duration::from_secs(3_155_760_000));
    assert_eq!(config.backlog_config().warn_delay, iqueue::model::MAX_DELAY);
}

#[test]
fn load_reads_file_and_names_log_after_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gracedb.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "[general]\nprocess_type = \"log_only\"\nlog_directory = \"{}\"",
        dir.path().display()
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.path.as_deref(), Some(path.as_path()));
    assert_eq!(config.label(), "gracedb");
    assert_eq!(
        config.log_file(),
        Some(dir.path().join("log_only_gracedb.log"))
    );
}

#[test]
fn load_fails_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("absent.toml")));
}

#[test]
fn env_overrides_log_level_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, MINIMAL).unwrap();

    unsafe {
        std::env::set_var("IQUEUE_LOG_LEVEL", "iqueue=trace");
    }
    let config = Config::load(&path).unwrap();
    unsafe {
        std::env::remove_var("IQUEUE_LOG_LEVEL");
    }

    assert_eq!(config.general.log_level, "iqueue=trace");
}

#[test]
fn smtp_credentials_need_both_variables() {
    unsafe {
        std::env::set_var("SMTP_USERNAME", "mailer");
        std::env::remove_var("SMTP_PASSWORD");
    }
    assert!(SmtpCredentials::from_env().is_none());

    unsafe {
        std::env::set_var("SMTP_PASSWORD", "hunter2");
    }
    let creds = SmtpCredentials::from_env().unwrap();
    assert_eq!(creds.username, "mailer");
    assert_eq!(creds.password.expose_secret(), "hunter2");

    unsafe {
        std::env::remove_var("SMTP_USERNAME");
        std::env::remove_var("SMTP_PASSWORD");
    }
}
