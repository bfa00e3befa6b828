//! Integration tests for the decision logic variants.

use chrono::{DateTime, TimeDelta, Utc};
use iqueue::decision::{DecisionLogic, ProcessType, SampleLogic, Schedule};
use iqueue::error::Error;
use iqueue::model::{Alert, QueueItem, RawAlert};
use iqueue::queue::{KeyIndex, SortedQueue};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

fn alert(body: &str) -> Alert {
    RawAlert::new(body, at(100)).decode().unwrap()
}

fn params(text: &str) -> toml::Table {
    toml::from_str(text).unwrap()
}

#[test]
fn process_type_parses_known_tags() {
    assert_eq!("test".parse::<ProcessType>().unwrap(), ProcessType::Test);
    assert_eq!("log_only".parse::<ProcessType>().unwrap(), ProcessType::LogOnly);
    assert_eq!(ProcessType::LogOnly.to_string(), "log_only");
}

#[test]
fn unknown_process_type_is_an_error() {
    let err = "event_supervisor".parse::<ProcessType>().unwrap_err();
    assert!(matches!(err, Error::UnknownProcessType(ref tag) if tag == "event_supervisor"));
}

#[test]
fn sample_logic_defaults_to_five_and_ten_seconds() {
    let logic = SampleLogic::from_params(&toml::Table::new()).unwrap();
    assert_eq!(logic.delays(), &[5.0, 10.0]);
}

#[test]
fn sample_logic_reads_delays_from_params() {
    let logic = SampleLogic::from_params(&params("[test]\ndelays = [1, 2.5, 4]\n")).unwrap();
    assert_eq!(logic.delays(), &[1.0, 2.5, 4.0]);
}

#[test]
fn sample_logic_rejects_bad_delays() {
    assert!(matches!(
        SampleLogic::from_params(&params("[test]\ndelays = 3\n")),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        SampleLogic::from_params(&params("[test]\ndelays = [1, \"two\"]\n")),
        Err(Error::Config(_))
    ));
    assert!(ProcessType::Test.build(&params("[test]\ndelays = 3\n")).is_err());
}

#[test]
fn sample_logic_rejects_delays_out_of_range() {
    for bad in ["inf", "nan", "-1.0", "1e15"] {
        let table = params(&format!("[test]\ndelays = [5, {bad}]\n"));
        assert!(
            matches!(ProcessType::Test.build(&table), Err(Error::Config(_))),
            "accepted delay {bad}"
        );
    }
}

#[test]
fn unusable_delay_fails_apply_instead_of_panicking() {
    let logic = SampleLogic::new(vec![1.0, f64::INFINITY]);
    let mut queue = SortedQueue::<QueueItem>::new();
    let mut index = KeyIndex::new();

    let mut schedule = Schedule::new(&mut queue, &mut index);
    let result = logic.apply(&mut schedule, &alert(r#"{"uid": "E1"}"#), &toml::Table::new());

    assert!(matches!(result, Err(Error::Config(_))));
    assert!(queue.is_empty());
    assert!(index.is_empty());
}

#[test]
fn sample_logic_builds_one_task_per_delay() {
    let logic = SampleLogic::from_params(&params("[test]\ndelays = [1, 2.5, 4]\n")).unwrap();
    let mut queue = SortedQueue::<QueueItem>::new();
    let mut index = KeyIndex::new();

    let mut schedule = Schedule::new(&mut queue, &mut index);
    logic
        .apply(&mut schedule, &alert(r#"{"uid": "S123"}"#), &toml::Table::new())
        .unwrap();

    let item = queue.peek_front().unwrap();
    assert_eq!(item.tasks().len(), 3);
    assert_eq!(item.key(), Some("S123"));
    assert_eq!(item.description(), "print alert for S123");
    assert_eq!(item.created_at(), at(100));
    assert_eq!(item.due_at(), Some(at(101)));
    assert_eq!(item.tasks()[1].delay(), TimeDelta::milliseconds(2_500));
    assert_eq!(item.tasks()[0].args()["graceid"], "S123");
    assert_eq!(index.front("S123"), Some(item.id()));
}

#[test]
fn alert_without_uid_is_a_decision_error() {
    let logic = SampleLogic::new(vec![1.0]);
    let mut queue = SortedQueue::<QueueItem>::new();
    let mut index = KeyIndex::new();

    let mut schedule = Schedule::new(&mut queue, &mut index);
    let err = logic
        .apply(&mut schedule, &alert(r#"{"other": 1}"#), &toml::Table::new())
        .unwrap_err();

    assert!(matches!(err, Error::Decision(_)));
    assert!(queue.is_empty());
}

#[test]
fn remove_command_requires_graceid() {
    let logic = SampleLogic::new(vec![1.0]);
    let mut queue = SortedQueue::<QueueItem>::new();
    let mut index = KeyIndex::new();

    let mut schedule = Schedule::new(&mut queue, &mut index);
    let result = logic.apply(
        &mut schedule,
        &alert(r#"{"uid": "command", "command": "remove"}"#),
        &toml::Table::new(),
    );

    assert!(matches!(result, Err(Error::Decision(_))));
}

#[test]
fn schedule_remove_key_clears_both_containers() {
    let logic = SampleLogic::new(vec![1.0, 2.0]);
    let mut queue = SortedQueue::<QueueItem>::new();
    let mut index = KeyIndex::new();

    let mut schedule = Schedule::new(&mut queue, &mut index);
    logic
        .apply(&mut schedule, &alert(r#"{"uid": "A"}"#), &toml::Table::new())
        .unwrap();
    logic
        .apply(&mut schedule, &alert(r#"{"uid": "B"}"#), &toml::Table::new())
        .unwrap();
    let removed = schedule.remove_key("A");

    assert_eq!(removed.len(), 1);
    assert_eq!(queue.len(), 1);
    assert!(!index.contains_key("A"));
    assert!(index.contains_key("B"));
}
