// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The "thin data-access interface" onto the relational metadata store
//! (`spec.md` §1: the DSS itself is an external collaborator, out of scope;
//! this trait is the boundary the engine and daemon are written against).

use crate::error::DssError;
use async_trait::async_trait;
use lrs_core::{Device, DeviceId, Lock, LockType, Medium, MediumId};

/// CRUD + locking over the three tables `spec.md` §3 describes: devices,
/// media, and locks. No transactions, no joins — every method is a single
/// row operation, matching the way the device worker and lock recovery
/// actually touch the DSS (`spec.md` §4.1, §4.4).
#[async_trait]
pub trait DssGateway: Send + Sync + 'static {
    async fn get_device(&self, id: &DeviceId) -> Result<Option<Device>, DssError>;
    async fn put_device(&self, device: &Device) -> Result<(), DssError>;
    async fn list_devices(&self) -> Result<Vec<Device>, DssError>;

    async fn get_medium(&self, id: &MediumId) -> Result<Option<Medium>, DssError>;
    async fn put_medium(&self, medium: &Medium) -> Result<(), DssError>;
    async fn list_media(&self) -> Result<Vec<Medium>, DssError>;

    /// Acquires a lock. Fails with [`DssError::LockConflict`] if a different
    /// holder already owns `(lock_type, id)` — `spec.md` §3: "Unique on
    /// (type, id)."
    async fn acquire_lock(&self, lock: Lock) -> Result<(), DssError>;

    /// Releases a lock. Fails with [`DssError::LockNotHeld`] unless `hostname`
    /// and `owner_pid` match the current holder (`spec.md` §3: "Only the
    /// holder... may release").
    async fn release_lock(
        &self,
        lock_type: LockType,
        id: &str,
        hostname: &str,
        owner_pid: u32,
    ) -> Result<(), DssError>;

    /// Lists every lock of `lock_type`, across all hostnames — used by
    /// startup reconciliation to find locks this host or a dead peer left
    /// behind (`spec.md` §4.4).
    async fn list_locks(&self, lock_type: LockType) -> Result<Vec<Lock>, DssError>;

    /// Releases a lock regardless of current holder. Startup reconciliation
    /// (`spec.md` §4.4) uses this for a predecessor daemon's rows: the pid
    /// that acquired them is gone, so it can never match this process's own
    /// `owner_pid` the way [`Self::release_lock`] requires. A no-op (not an
    /// error) if the row is already gone, since reconciliation runs once and
    /// must not fail on a race with a concurrent release.
    async fn force_release_lock(&self, lock_type: LockType, id: &str) -> Result<(), DssError>;
}
