//! Integration tests for backlog alerting hysteresis.

use chrono::{DateTime, TimeDelta, Utc};
use iqueue::engine::{BacklogAlerter, BacklogConfig, BacklogEvent};

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("valid timestamp")
}

fn alerter(threshold: usize, delay_secs: i64, max_warn: u32) -> BacklogAlerter {
    BacklogAlerter::new(BacklogConfig {
        warn_threshold: threshold,
        warn_delay: TimeDelta::seconds(delay_secs),
        max_warn,
    })
}

#[test]
fn warns_once_within_cooldown_then_recovers() {
    let mut alerter = alerter(3, 100, 2);

    assert_eq!(
        alerter.check(4, at(0)),
        Some(BacklogEvent::Warning {
            count: 1,
            last: false,
            len: 4
        })
    );
    assert_eq!(alerter.state().warn_count, 1);

    assert_eq!(alerter.check(4, at(10)), None);
    assert_eq!(alerter.check(4, at(50)), None);

    assert_eq!(
        alerter.check(2, at(60)),
        Some(BacklogEvent::Recovery {
            was_silenced: false,
            len: 2
        })
    );
    assert_eq!(alerter.state().warn_count, 0);
    assert_eq!(alerter.state().next_allowed, None);
}

#[test]
fn reaches_cap_then_goes_silent_until_recovery() {
    let mut alerter = alerter(3, 100, 2);

    assert!(matches!(
        alerter.check(5, at(0)),
        Some(BacklogEvent::Warning {
            count: 1,
            last: false,
            ..
        })
    ));
    assert!(matches!(
        alerter.check(5, at(100)),
        Some(BacklogEvent::Warning {
            count: 2,
            last: true,
            ..
        })
    ));
    // third breach past the cooldown: no further warning
    assert_eq!(alerter.check(5, at(200)), Some(BacklogEvent::Silenced { len: 5 }));
    assert_eq!(alerter.state().warn_count, 2);
    assert_eq!(alerter.check(5, at(250)), None);

    assert_eq!(
        alerter.check(3, at(300)),
        Some(BacklogEvent::Recovery {
            was_silenced: true,
            len: 3
        })
    );
}

#[test]
fn recovery_rearms_warnings_immediately() {
    let mut alerter = alerter(3, 100, 2);
    alerter.check(4, at(0));
    alerter.check(1, at(1));

    assert!(matches!(
        alerter.check(4, at(2)),
        Some(BacklogEvent::Warning { count: 1, .. })
    ));
}

#[test]
fn length_at_threshold_is_normal() {
    let mut alerter = alerter(3, 100, 2);
    assert_eq!(alerter.check(3, at(0)), None);
    assert_eq!(alerter.check(0, at(1)), None);
    assert_eq!(alerter.state().warn_count, 0);
}

#[test]
fn huge_warn_delay_saturates_instead_of_overflowing() {
    let mut alerter = BacklogAlerter::new(BacklogConfig {
        warn_threshold: 0,
        warn_delay: TimeDelta::MAX,
        max_warn: 5,
    });

    assert!(matches!(
        alerter.check(1, at(0)),
        Some(BacklogEvent::Warning { count: 1, .. })
    ));
    assert_eq!(alerter.state().next_allowed, Some(DateTime::<Utc>::MAX_UTC));
    assert_eq!(alerter.check(1, at(1_000_000)), None);
    assert_eq!(alerter.config().max_warn, 5);
}
