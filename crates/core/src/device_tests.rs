// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn dev() -> Device {
    Device::new(DeviceId::new("drive0"), Family::Tape, "LTO5", "/dev/st0", "host-a")
}

#[test]
fn state_machine_allows_only_spec_edges() {
    assert!(OpStatus::Empty.can_transition_to(OpStatus::Loaded));
    assert!(OpStatus::Loaded.can_transition_to(OpStatus::Mounted));
    assert!(OpStatus::Mounted.can_transition_to(OpStatus::Loaded));
    assert!(OpStatus::Loaded.can_transition_to(OpStatus::Empty));
    assert!(!OpStatus::Empty.can_transition_to(OpStatus::Mounted));
    assert!(!OpStatus::Mounted.can_transition_to(OpStatus::Empty));
}

#[test]
fn failed_is_reachable_from_every_state() {
    for s in [OpStatus::Empty, OpStatus::Loaded, OpStatus::Mounted, OpStatus::Failed] {
        assert!(s.can_transition_to(OpStatus::Failed));
    }
}

#[test]
fn invariant_requires_medium_and_mount_path_when_mounted() {
    let mut d = dev();
    d.op_status = OpStatus::Mounted;
    assert!(!d.invariant_holds());
    d.loaded_medium = Some(crate::medium::MediumId::new("vol0"));
    d.mount_path = Some("/mnt/st0".into());
    assert!(d.invariant_holds());
}

#[test]
fn empty_and_loaded_states_never_require_mount_path() {
    let d = dev();
    assert!(d.invariant_holds());
}

#[test]
fn family_round_trips_through_str() {
    assert_eq!("tape".parse::<Family>().expect("parse"), Family::Tape);
    assert_eq!("dir".parse::<Family>().expect("parse"), Family::Dir);
    assert!("nope".parse::<Family>().is_err());
}
