// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device sync batcher (`spec.md` §4.3): decides when a device worker
//! must flush pending releases to the medium and update DSS stats.

use lrs_core::{Clock, Errno, RequestContainer, SubStatus};
use std::time::{Duration, Instant};

/// One queued client release awaiting the next sync tick.
pub struct PendingRelease {
    pub request: RequestContainer,
    pub sub_request_idx: usize,
    pub written_bytes: u64,
    /// Non-zero client-reported rc on this release (`spec.md` §9 ambiguity
    /// #2: force-drain without syncing, mark the medium FAILED).
    pub client_errno: Option<Errno>,
    pub queued_at: Instant,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncThresholds {
    pub sync_time: Duration,
    pub sync_nb_req: usize,
    pub sync_wsize_bytes: u64,
}

#[derive(Default)]
pub struct SyncBatch {
    pending: Vec<PendingRelease>,
}

impl SyncBatch {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, release: PendingRelease) {
        self.pending.push(release);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drops entries whose parent has already been cancelled by a sibling
    /// failure elsewhere (`spec.md` §4.1 main loop step 2).
    pub fn scrub_aborted(&mut self) {
        self.pending.retain(|p| {
            p.request.sub_status(p.sub_request_idx) != Some(SubStatus::Cancel)
        });
    }

    pub fn oldest_queued_at(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.queued_at).min()
    }

    pub fn total_written_bytes(&self) -> u64 {
        self.pending.iter().map(|p| p.written_bytes).sum()
    }

    /// `spec.md` §4.3: any of the count/time/byte thresholds, or a forced
    /// drain on shutdown/stop/client-error.
    pub fn needs_sync<C: Clock>(
        &self,
        clock: &C,
        thresholds: &SyncThresholds,
        daemon_shutting_down: bool,
        worker_stopping: bool,
    ) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        if self.pending.len() >= thresholds.sync_nb_req {
            return true;
        }
        if let Some(oldest) = self.oldest_queued_at() {
            if clock.now().saturating_duration_since(oldest) >= thresholds.sync_time {
                return true;
            }
        }
        if self.total_written_bytes() >= thresholds.sync_wsize_bytes {
            return true;
        }
        if daemon_shutting_down || worker_stopping {
            return true;
        }
        if self.pending.iter().any(|p| p.client_errno.is_some()) {
            return true;
        }
        false
    }

    /// Whether the physical `medium_sync` call should actually run: skipped
    /// when the most recently queued release carried a non-zero client rc
    /// (`spec.md` §4.3: "skipping physical sync on client-reported error to
    /// avoid persisting corrupt state").
    pub fn should_call_medium_sync(&self) -> bool {
        !self.pending.iter().any(|p| p.client_errno.is_some())
    }

    pub fn drain(&mut self) -> Vec<PendingRelease> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
#[path = "sync_batch_tests.rs"]
mod tests;
