// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lrs_core::MediumId;

fn snapshot(id: &str, idle: bool, loaded: Option<&str>) -> DeviceSnapshot {
    DeviceSnapshot {
        id: DeviceId::new(id),
        is_idle: idle,
        is_online: true,
        is_sched_ready: true,
        technology: None,
        loaded_medium: loaded.map(MediumId::new),
    }
}

#[test]
fn a_second_reader_of_the_same_medium_piggybacks_on_the_holder() {
    let candidates = vec![snapshot("dev-0", true, None), snapshot("dev-1", false, Some("vol-9"))];
    let req = DispatchRequest {
        kind: DispatchKind::Read,
        target_medium: Some(MediumId::new("vol-9")),
        technology: None,
    };
    assert_eq!(
        GroupedReadDispatcher.select(&candidates, &req),
        Some(DeviceId::new("dev-1"))
    );
}

#[test]
fn falls_back_to_any_idle_device_when_nothing_holds_the_target_medium() {
    let candidates = vec![snapshot("dev-0", true, None)];
    let req = DispatchRequest {
        kind: DispatchKind::Read,
        target_medium: Some(MediumId::new("vol-9")),
        technology: None,
    };
    assert_eq!(
        GroupedReadDispatcher.select(&candidates, &req),
        Some(DeviceId::new("dev-0"))
    );
}

#[test]
fn no_admissible_device_and_no_holder_returns_none() {
    let candidates = vec![snapshot("dev-0", false, None)];
    let req = DispatchRequest {
        kind: DispatchKind::Read,
        target_medium: Some(MediumId::new("vol-9")),
        technology: None,
    };
    assert!(GroupedReadDispatcher.select(&candidates, &req).is_none());
}
