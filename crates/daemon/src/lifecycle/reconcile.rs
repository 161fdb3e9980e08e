// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock recovery / startup reconciliation (`spec.md` §4.4). Grounded on
//! `oj-daemon::lifecycle::reconcile::reconcile_state`'s shape: query
//! persisted rows, compare against current reality, resolve or leave
//! alone — retargeted here from job/agent-run liveness to DSS lock-row
//! liveness. Runs to completion before the listener binds, matching that
//! function's "bind socket last" ordering.

use std::collections::HashSet;

use lrs_core::{Device, Lock, LockType, Medium};
use lrs_dss::{DssError, DssGateway};
use tracing::{info, warn};

/// `spec.md` I1/I2: releases every lock row left behind by a predecessor
/// daemon on this host, plus any row (any hostname) whose target id is not
/// live in the local device/medium view. Locks held by a different,
/// presumably still-running host are left untouched (I1).
pub async fn reconcile_locks<D: DssGateway>(
    dss: &D,
    hostname: &str,
    local_devices: &[Device],
    local_media: &[Medium],
) -> Result<(), DssError> {
    let device_ids: HashSet<&str> = local_devices.iter().map(|d| d.id.as_str()).collect();
    let medium_ids: HashSet<&str> = local_media.iter().map(|m| m.id.as_str()).collect();

    for lock_type in [LockType::Device, LockType::Media, LockType::MediaUpdate] {
        let rows = dss.list_locks(lock_type).await?;
        for lock in rows {
            let live = is_live(lock_type, &lock, &device_ids, &medium_ids);

            if lock.hostname == hostname {
                // Predecessor daemon: the pid that took this lock is gone.
                info!(?lock_type, id = %lock.id, "releasing predecessor lock on restart");
                dss.force_release_lock(lock_type, &lock.id).await?;
                continue;
            }

            if !live {
                info!(?lock_type, id = %lock.id, host = %lock.hostname, "releasing orphaned lock (no live target)");
                dss.force_release_lock(lock_type, &lock.id).await?;
                continue;
            }

            // `spec.md` I1: a different, live host's lock is never touched.
            warn!(?lock_type, id = %lock.id, host = %lock.hostname, "lock held by another host, leaving as-is");
        }
    }
    Ok(())
}

fn is_live(
    lock_type: LockType,
    lock: &Lock,
    device_ids: &HashSet<&str>,
    medium_ids: &HashSet<&str>,
) -> bool {
    match lock_type {
        LockType::Device => device_ids.contains(lock.id.as_str()),
        LockType::Media | LockType::MediaUpdate => medium_ids.contains(lock.id.as_str()),
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
