// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::device::Family;

fn vol() -> Medium {
    Medium::new(MediumId::new("vol0"), Family::Tape, "LTO5", FsType::Ltfs, AddressType::Linear)
}

#[test]
fn zero_free_space_forces_full() {
    let mut m = vol();
    m.fs_status = FsStatus::Used;
    m.apply_free_space(0);
    assert_eq!(m.fs_status, FsStatus::Full);
}

#[test]
fn nonzero_free_space_does_not_force_full() {
    let mut m = vol();
    m.apply_free_space(4096);
    assert_ne!(m.fs_status, FsStatus::Full);
}

#[test]
fn first_write_advances_blank_or_empty_to_used() {
    let mut m = vol();
    assert_eq!(m.fs_status, FsStatus::Blank);
    m.advance_on_first_write();
    assert_eq!(m.fs_status, FsStatus::Used);

    let mut m2 = vol();
    m2.fs_status = FsStatus::Empty;
    m2.advance_on_first_write();
    assert_eq!(m2.fs_status, FsStatus::Used);
}

#[test]
fn full_medium_is_not_usable_for_write() {
    let mut m = vol();
    m.fs_status = FsStatus::Full;
    assert!(!m.is_usable_for_write());
}

#[test]
fn failed_medium_is_not_usable_for_write() {
    let mut m = vol();
    m.mark_failed();
    assert!(!m.is_usable_for_write());
}
