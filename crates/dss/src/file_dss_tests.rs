// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lrs_core::{AddressType, Family, FsType};
use tempfile::tempdir;

fn a_device() -> Device {
    Device::new(DeviceId::new("dev-0"), Family::Tape, "ULT3580", "/dev/nst0", "host-a")
}

fn a_medium() -> Medium {
    Medium::new(
        MediumId::new("vol-0"),
        Family::Tape,
        "LTO8",
        FsType::Ltfs,
        AddressType::Linear,
    )
}

#[tokio::test]
async fn put_then_get_device_round_trips() {
    let dir = tempdir().expect("tempdir");
    let dss = FileDss::open(dir.path().join("dss.json")).expect("open");
    dss.put_device(&a_device()).await.expect("put");
    let fetched = dss
        .get_device(&DeviceId::new("dev-0"))
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched.path, "/dev/nst0");
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("dss.json");
    {
        let dss = FileDss::open(&path).expect("open");
        dss.put_medium(&a_medium()).await.expect("put");
    }
    let reopened = FileDss::open(&path).expect("reopen");
    let media = reopened.list_media().await.expect("list");
    assert_eq!(media.len(), 1);
}

#[tokio::test]
async fn acquire_lock_conflicts_with_a_different_holder() {
    let dir = tempdir().expect("tempdir");
    let dss = FileDss::open(dir.path().join("dss.json")).expect("open");
    dss.acquire_lock(Lock::new(LockType::Device, "dev-0", "host-a", 100, 1))
        .await
        .expect("first acquire");

    let conflict = dss
        .acquire_lock(Lock::new(LockType::Device, "dev-0", "host-b", 200, 2))
        .await;
    assert!(matches!(conflict, Err(DssError::LockConflict(..))));
}

#[tokio::test]
async fn acquire_lock_is_idempotent_for_the_same_holder() {
    let dir = tempdir().expect("tempdir");
    let dss = FileDss::open(dir.path().join("dss.json")).expect("open");
    dss.acquire_lock(Lock::new(LockType::Device, "dev-0", "host-a", 100, 1))
        .await
        .expect("first acquire");
    dss.acquire_lock(Lock::new(LockType::Device, "dev-0", "host-a", 100, 5))
        .await
        .expect("re-acquire by the same holder");
}

#[tokio::test]
async fn release_lock_rejects_a_non_holder() {
    let dir = tempdir().expect("tempdir");
    let dss = FileDss::open(dir.path().join("dss.json")).expect("open");
    dss.acquire_lock(Lock::new(LockType::Device, "dev-0", "host-a", 100, 1))
        .await
        .expect("acquire");

    let rejected = dss
        .release_lock(LockType::Device, "dev-0", "host-b", 200)
        .await;
    assert!(matches!(rejected, Err(DssError::LockNotHeld(..))));
}

#[tokio::test]
async fn release_lock_by_the_holder_succeeds_and_list_locks_reflects_it() {
    let dir = tempdir().expect("tempdir");
    let dss = FileDss::open(dir.path().join("dss.json")).expect("open");
    dss.acquire_lock(Lock::new(LockType::Media, "vol-0", "host-a", 100, 1))
        .await
        .expect("acquire");
    dss.release_lock(LockType::Media, "vol-0", "host-a", 100)
        .await
        .expect("release");

    let remaining = dss.list_locks(LockType::Media).await.expect("list");
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn corrupt_file_is_rotated_to_bak_and_treated_as_empty() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("dss.json");
    std::fs::write(&path, b"not json").expect("write garbage");

    let dss = FileDss::open(&path).expect("open recovers");
    assert!(dss.list_devices().await.expect("list").is_empty());
    assert!(path.with_extension("bak").exists());
}
