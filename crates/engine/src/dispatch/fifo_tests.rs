// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lrs_core::MediumId;

fn snapshot(id: &str, idle: bool) -> DeviceSnapshot {
    DeviceSnapshot {
        id: DeviceId::new(id),
        is_idle: idle,
        is_online: true,
        is_sched_ready: true,
        technology: None,
        loaded_medium: None,
    }
}

#[test]
fn picks_the_first_admissible_device_in_registration_order() {
    let candidates = vec![snapshot("dev-0", false), snapshot("dev-1", true), snapshot("dev-2", true)];
    let req = DispatchRequest {
        kind: crate::dispatch::DispatchKind::Read,
        target_medium: None,
        technology: None,
    };
    let chosen = FifoDispatcher.select(&candidates, &req);
    assert_eq!(chosen, Some(DeviceId::new("dev-1")));
}

#[test]
fn no_admissible_device_returns_none() {
    let candidates = vec![snapshot("dev-0", false)];
    let req = DispatchRequest {
        kind: crate::dispatch::DispatchKind::Write,
        target_medium: None,
        technology: None,
    };
    assert!(FifoDispatcher.select(&candidates, &req).is_none());
}

#[test]
fn registration_order_wins_even_when_a_later_device_holds_the_target_medium() {
    let mut loaded = snapshot("dev-1", true);
    loaded.loaded_medium = Some(MediumId::new("vol-9"));
    let empty = snapshot("dev-0", true);
    let candidates = vec![empty, loaded];
    let req = DispatchRequest {
        kind: crate::dispatch::DispatchKind::Read,
        target_medium: Some(MediumId::new("vol-9")),
        technology: None,
    };
    assert_eq!(
        FifoDispatcher.select(&candidates, &req),
        Some(DeviceId::new("dev-0"))
    );
}
