// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lrs_core::{AddressType, Family, FsType};

#[tokio::test]
async fn seeded_lock_bypasses_holder_check_for_reconciliation_tests() {
    let dss = FakeDss::new();
    dss.seed_lock(Lock::new(LockType::Device, "dev-0", "ghost-host", 999, 1));
    let locks = dss.list_locks(LockType::Device).await.expect("list");
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].hostname, "ghost-host");
}

#[tokio::test]
async fn put_and_get_medium_round_trips() {
    let dss = FakeDss::new();
    let medium = Medium::new(
        MediumId::new("vol-0"),
        Family::Tape,
        "LTO8",
        FsType::Ltfs,
        AddressType::Linear,
    );
    dss.put_medium(&medium).await.expect("put");
    let fetched = dss
        .get_medium(&MediumId::new("vol-0"))
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched.model, "LTO8");
}

#[tokio::test]
async fn acquire_lock_conflicts_with_a_different_holder() {
    let dss = FakeDss::new();
    dss.acquire_lock(Lock::new(LockType::Device, "dev-0", "host-a", 100, 1))
        .await
        .expect("acquire");
    let conflict = dss
        .acquire_lock(Lock::new(LockType::Device, "dev-0", "host-b", 200, 2))
        .await;
    assert!(matches!(conflict, Err(DssError::LockConflict(..))));
}
