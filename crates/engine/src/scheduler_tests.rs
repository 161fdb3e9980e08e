// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::device::{DeviceContext, WorkItem};
use crate::dispatch::fair_share::{FairShareDispatcher, FairShareLimits, TechLimits};
use crate::dispatch::fifo::FifoDispatcher;
use crate::retry::RetryPolicy;
use crate::sync_batch::SyncThresholds;
use lrs_adapters::library::fake::FakeLibraryAdapter;
use lrs_adapters::filesystem::fake::FakeFilesystemAdapter;
use lrs_core::{Device, DeviceId, Family, FakeClock, FsType, Medium, MediumId, RequestContainer, RequestId, RequestKind};
use lrs_dss::FakeDss;
use std::collections::HashMap;
use std::time::Duration;

fn thresholds() -> SyncThresholds {
    SyncThresholds {
        sync_time: Duration::from_secs(3600),
        sync_nb_req: 1000,
        sync_wsize_bytes: u64::MAX,
    }
}

fn ctx(dss: std::sync::Arc<FakeDss>) -> DeviceContext<FakeLibraryAdapter, FakeFilesystemAdapter, FakeDss, FakeClock> {
    DeviceContext {
        library: std::sync::Arc::new(FakeLibraryAdapter::new()),
        filesystem: std::sync::Arc::new(FakeFilesystemAdapter::new()),
        dss,
        clock: FakeClock::new(),
        hostname: "host1".to_string(),
        pid: 1,
        mount_prefix: "/mnt/".to_string(),
        retry_policy: RetryPolicy::default(),
        sync_thresholds: thresholds(),
    }
}

#[tokio::test]
async fn places_unit_on_idle_device_and_publishes_response() {
    let dss = std::sync::Arc::new(FakeDss::new());
    let medium_id = MediumId::new("vol0");
    dss.seed_medium(Medium::new(medium_id.clone(), Family::Dir, "dirmod", FsType::Posix, lrs_core::AddressType::Linear));

    let device = Device::new(DeviceId::new("drv0"), Family::Dir, "dirmod", "/dev/drv0", "host1");
    let (worker, _handle) = crate::device::DeviceWorker::spawn(device, ctx(dss));

    let scheduler = Scheduler::new(
        Family::Dir,
        vec![worker],
        Box::new(FifoDispatcher),
        Duration::from_secs(5),
    );

    let request = RequestContainer::new(RequestId::new("req-1"), RequestKind::Format, 0, 1);
    let sub = lrs_core::SubRequest::new(lrs_core::SubRequestId::new("sub-1"), request.clone(), 0);
    scheduler
        .submit(DispatchUnit {
            sub_request: sub,
            work: WorkItem::Format {
                medium_id: medium_id.clone(),
                fs_type: FsType::Posix,
                unlock: false,
            },
            technology: None,
            enqueued_at: std::time::Instant::now(),
        })
        .unwrap();

    scheduler.tick();
    for _ in 0..50 {
        if request.take_response().is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("request never completed");
}

#[tokio::test]
async fn stop_accepting_rejects_new_submissions() {
    let dss = std::sync::Arc::new(FakeDss::new());
    let scheduler: Scheduler<FakeLibraryAdapter, FakeFilesystemAdapter, FakeDss, FakeClock> =
        Scheduler::new(Family::Dir, vec![], Box::new(FifoDispatcher), Duration::from_secs(5));
    scheduler.stop_accepting();

    let request = RequestContainer::new(RequestId::new("req-2"), RequestKind::Ping, 0, 1);
    let sub = lrs_core::SubRequest::new(lrs_core::SubRequestId::new("sub-1"), request, 0);
    let unit = DispatchUnit {
        sub_request: sub,
        work: WorkItem::ReadWrite {
            medium_id: MediumId::new("vol0"),
            write: false,
        },
        technology: None,
        enqueued_at: std::time::Instant::now(),
    };
    assert!(scheduler.submit(unit).is_err());
}

#[tokio::test]
async fn cancel_queued_publishes_ecanceled_for_everything_still_waiting() {
    let scheduler: Scheduler<FakeLibraryAdapter, FakeFilesystemAdapter, FakeDss, FakeClock> =
        Scheduler::new(Family::Dir, vec![], Box::new(FifoDispatcher), Duration::from_secs(5));

    let request = RequestContainer::new(RequestId::new("req-3"), RequestKind::ReadAlloc, 0, 1);
    let sub = lrs_core::SubRequest::new(lrs_core::SubRequestId::new("sub-1"), request.clone(), 0);
    scheduler
        .submit(DispatchUnit {
            sub_request: sub,
            work: WorkItem::ReadWrite {
                medium_id: MediumId::new("vol0"),
                write: false,
            },
            technology: None,
            enqueued_at: std::time::Instant::now(),
        })
        .unwrap();

    scheduler.cancel_queued();
    match request.take_response() {
        Some(lrs_core::Response::Error { errno }) => {
            assert_eq!(errno, lrs_core::Errno::ECANCELED.as_negative());
        }
        other => panic!("expected error response, got {other:?}"),
    }
}

#[tokio::test]
async fn fair_share_slot_frees_once_the_sub_request_completes() {
    let dss = std::sync::Arc::new(FakeDss::new());
    let vol0 = MediumId::new("vol0");
    let vol1 = MediumId::new("vol1");
    dss.seed_medium(Medium::new(vol0.clone(), Family::Dir, "dirmod", FsType::Posix, lrs_core::AddressType::Linear));
    dss.seed_medium(Medium::new(vol1.clone(), Family::Dir, "dirmod", FsType::Posix, lrs_core::AddressType::Linear));

    let mut device = Device::new(DeviceId::new("drv0"), Family::Dir, "dirmod", "/dev/drv0", "host1");
    device.technology = Some("LTO5".to_string());
    let (worker, _handle) = crate::device::DeviceWorker::spawn(device, ctx(dss));

    let mut per_technology = HashMap::new();
    per_technology.insert(
        "LTO5".to_string(),
        TechLimits { min_format: 0, min_write: 0, min_read: 0, max_format: 1, max_write: 0, max_read: 0 },
    );
    let dispatcher = FairShareDispatcher::new(FairShareLimits { per_technology });

    let scheduler = Scheduler::new(Family::Dir, vec![worker], Box::new(dispatcher), Duration::from_secs(5));

    let first = RequestContainer::new(RequestId::new("req-1"), RequestKind::Format, 0, 1);
    let sub = lrs_core::SubRequest::new(lrs_core::SubRequestId::new("sub-1"), first.clone(), 0);
    scheduler
        .submit(DispatchUnit {
            sub_request: sub,
            work: WorkItem::Format { medium_id: vol0, fs_type: FsType::Posix, unlock: false },
            technology: Some("LTO5".to_string()),
            enqueued_at: std::time::Instant::now(),
        })
        .unwrap();
    scheduler.tick();

    let mut completed = false;
    for _ in 0..50 {
        if first.take_response().is_some() {
            completed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(completed, "first format never completed");

    // A fresh request of the same kind only clears admission once `tick`
    // has reaped the completed sub-request and released its reservation.
    let second = RequestContainer::new(RequestId::new("req-2"), RequestKind::Format, 0, 1);
    let sub = lrs_core::SubRequest::new(lrs_core::SubRequestId::new("sub-2"), second.clone(), 0);
    scheduler
        .submit(DispatchUnit {
            sub_request: sub,
            work: WorkItem::Format { medium_id: vol1, fs_type: FsType::Posix, unlock: false },
            technology: Some("LTO5".to_string()),
            enqueued_at: std::time::Instant::now(),
        })
        .unwrap();

    let mut admitted = false;
    for _ in 0..50 {
        scheduler.tick();
        if second.take_response().is_some() {
            admitted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(admitted, "second format of the same kind was never admitted after the first released its slot");
}
