// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lrs_core::{FakeClock, RequestId, RequestKind};

fn a_release(clock: &FakeClock, written_bytes: u64, client_errno: Option<Errno>) -> PendingRelease {
    PendingRelease {
        request: RequestContainer::new(RequestId::new("r0"), RequestKind::Release, 0, 1),
        sub_request_idx: 0,
        written_bytes,
        client_errno,
        queued_at: clock.now(),
    }
}

fn thresholds() -> SyncThresholds {
    SyncThresholds {
        sync_time: Duration::from_millis(500),
        sync_nb_req: 4,
        sync_wsize_bytes: 1 << 20,
    }
}

#[test]
fn empty_batch_never_needs_sync() {
    let clock = FakeClock::new();
    let batch = SyncBatch::new();
    assert!(!batch.needs_sync(&clock, &thresholds(), false, false));
}

#[test]
fn count_threshold_forces_sync() {
    let clock = FakeClock::new();
    let mut batch = SyncBatch::new();
    for _ in 0..4 {
        batch.push(a_release(&clock, 0, None));
    }
    assert!(batch.needs_sync(&clock, &thresholds(), false, false));
}

#[test]
fn time_threshold_forces_sync() {
    let clock = FakeClock::new();
    let mut batch = SyncBatch::new();
    batch.push(a_release(&clock, 0, None));
    clock.advance(Duration::from_millis(600));
    assert!(batch.needs_sync(&clock, &thresholds(), false, false));
}

#[test]
fn byte_threshold_forces_sync() {
    let clock = FakeClock::new();
    let mut batch = SyncBatch::new();
    batch.push(a_release(&clock, 2 << 20, None));
    assert!(batch.needs_sync(&clock, &thresholds(), false, false));
}

#[test]
fn shutdown_forces_a_drain_with_a_single_pending_entry() {
    let clock = FakeClock::new();
    let mut batch = SyncBatch::new();
    batch.push(a_release(&clock, 0, None));
    assert!(batch.needs_sync(&clock, &thresholds(), true, false));
}

#[test]
fn client_error_forces_sync_but_skips_the_physical_call() {
    let clock = FakeClock::new();
    let mut batch = SyncBatch::new();
    batch.push(a_release(&clock, 0, Some(Errno::EIO)));
    assert!(batch.needs_sync(&clock, &thresholds(), false, false));
    assert!(!batch.should_call_medium_sync());
}

#[test]
fn scrub_removes_entries_cancelled_by_a_sibling() {
    let mut batch = SyncBatch::new();
    let request = RequestContainer::new(RequestId::new("r0"), RequestKind::Release, 0, 2);
    request.cancel_remaining(1);
    batch.push(PendingRelease {
        request: request.clone(),
        sub_request_idx: 0,
        written_bytes: 0,
        client_errno: None,
        queued_at: Instant::now(),
    });
    batch.scrub_aborted();
    assert!(batch.is_empty());
}
