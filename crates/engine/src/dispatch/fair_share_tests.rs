// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn lto5_drive(idle: bool) -> DeviceSnapshot {
    DeviceSnapshot {
        id: DeviceId::new("dev-0"),
        is_idle: idle,
        is_online: true,
        is_sched_ready: true,
        technology: Some("LTO5".to_string()),
        loaded_medium: None,
    }
}

fn limits_zero_write_one_read_one() -> FairShareLimits {
    let mut per_technology = HashMap::new();
    per_technology.insert(
        "LTO5".to_string(),
        TechLimits {
            min_format: 0,
            min_write: 0,
            min_read: 0,
            max_format: 0,
            max_write: 1,
            max_read: 1,
        },
    );
    FairShareLimits { per_technology }
}

fn write_req() -> DispatchRequest {
    DispatchRequest {
        kind: DispatchKind::Write,
        target_medium: None,
        technology: Some("LTO5".to_string()),
    }
}

fn read_req() -> DispatchRequest {
    DispatchRequest {
        kind: DispatchKind::Read,
        target_medium: None,
        technology: Some("LTO5".to_string()),
    }
}

#[test]
fn write_is_admitted_when_under_the_max() {
    let dispatcher = FairShareDispatcher::new(limits_zero_write_one_read_one());
    let candidates = vec![lto5_drive(true)];
    assert_eq!(
        dispatcher.select(&candidates, &write_req()),
        Some(DeviceId::new("dev-0"))
    );
}

#[test]
fn read_is_refused_once_the_max_is_reached_until_released() {
    let dispatcher = FairShareDispatcher::new(limits_zero_write_one_read_one());
    let candidates = vec![lto5_drive(true)];

    // first read fills the max=1 reservation
    assert!(dispatcher.select(&candidates, &read_req()).is_some());
    assert_eq!(dispatcher.in_flight("LTO5", DispatchKind::Read), 1);

    // a second read hangs (T6) — no device admitted
    assert!(dispatcher.select(&candidates, &read_req()).is_none());

    dispatcher.release(&read_req());
    assert_eq!(dispatcher.in_flight("LTO5", DispatchKind::Read), 0);
    assert!(dispatcher.select(&candidates, &read_req()).is_some());
}

#[test]
fn format_is_refused_when_max_format_is_zero() {
    let dispatcher = FairShareDispatcher::new(limits_zero_write_one_read_one());
    let candidates = vec![lto5_drive(true)];
    let req = DispatchRequest {
        kind: DispatchKind::Format,
        target_medium: None,
        technology: Some("LTO5".to_string()),
    };
    assert!(dispatcher.select(&candidates, &req).is_none());
}

#[test]
fn mismatched_technology_is_never_selected() {
    let dispatcher = FairShareDispatcher::new(FairShareLimits::default());
    let candidates = vec![lto5_drive(true)];
    let req = DispatchRequest {
        kind: DispatchKind::Read,
        target_medium: None,
        technology: Some("LTO6".to_string()),
    };
    assert!(dispatcher.select(&candidates, &req).is_none());
}

#[test]
fn admitting_to_max_then_releasing_all_admits_a_fresh_request() {
    let dispatcher = FairShareDispatcher::new(limits_zero_write_one_read_one());
    let candidates = vec![lto5_drive(true)];

    assert!(dispatcher.select(&candidates, &write_req()).is_some());
    assert!(dispatcher.select(&candidates, &write_req()).is_none());

    dispatcher.release(&write_req());
    assert_eq!(dispatcher.in_flight("LTO5", DispatchKind::Write), 0);
    assert!(dispatcher.select(&candidates, &write_req()).is_some());
}

#[test]
fn unknown_technology_defaults_to_unrestricted() {
    let dispatcher = FairShareDispatcher::new(FairShareLimits::default());
    let candidates = vec![lto5_drive(true)];
    assert!(dispatcher.select(&candidates, &read_req()).is_some());
}
