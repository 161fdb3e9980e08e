// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `DssGateway` for engine/daemon unit tests: same semantics as
//! [`crate::FileDss`] minus the disk I/O.

use crate::error::DssError;
use crate::gateway::DssGateway;
use async_trait::async_trait;
use lrs_core::{Device, DeviceId, Lock, LockType, Medium, MediumId};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct State {
    devices: HashMap<String, Device>,
    media: HashMap<String, Medium>,
    locks: Vec<Lock>,
}

#[derive(Default)]
pub struct FakeDss {
    state: Mutex<State>,
}

impl FakeDss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a device directly, bypassing `put_device`, for test setup.
    pub fn seed_device(&self, device: Device) {
        self.state
            .lock()
            .devices
            .insert(device.id.as_str().to_string(), device);
    }

    /// Seeds a medium directly, for test setup.
    pub fn seed_medium(&self, medium: Medium) {
        self.state
            .lock()
            .media
            .insert(medium.id.as_str().to_string(), medium);
    }

    /// Seeds a lock directly, bypassing holder checks — used to simulate a
    /// predecessor daemon's locks before startup reconciliation runs.
    pub fn seed_lock(&self, lock: Lock) {
        self.state.lock().locks.push(lock);
    }
}

#[async_trait]
impl DssGateway for FakeDss {
    async fn get_device(&self, id: &DeviceId) -> Result<Option<Device>, DssError> {
        Ok(self.state.lock().devices.get(id.as_str()).cloned())
    }

    async fn put_device(&self, device: &Device) -> Result<(), DssError> {
        self.state
            .lock()
            .devices
            .insert(device.id.as_str().to_string(), device.clone());
        Ok(())
    }

    async fn list_devices(&self) -> Result<Vec<Device>, DssError> {
        Ok(self.state.lock().devices.values().cloned().collect())
    }

    async fn get_medium(&self, id: &MediumId) -> Result<Option<Medium>, DssError> {
        Ok(self.state.lock().media.get(id.as_str()).cloned())
    }

    async fn put_medium(&self, medium: &Medium) -> Result<(), DssError> {
        self.state
            .lock()
            .media
            .insert(medium.id.as_str().to_string(), medium.clone());
        Ok(())
    }

    async fn list_media(&self) -> Result<Vec<Medium>, DssError> {
        Ok(self.state.lock().media.values().cloned().collect())
    }

    async fn acquire_lock(&self, lock: Lock) -> Result<(), DssError> {
        let mut state = self.state.lock();
        if let Some(existing) = state
            .locks
            .iter()
            .find(|l| l.lock_type == lock.lock_type && l.id == lock.id)
        {
            if !existing.is_held_by(&lock.hostname, lock.owner_pid) {
                return Err(DssError::LockConflict(lock.lock_type, lock.id));
            }
            return Ok(());
        }
        state.locks.push(lock);
        Ok(())
    }

    async fn release_lock(
        &self,
        lock_type: LockType,
        id: &str,
        hostname: &str,
        owner_pid: u32,
    ) -> Result<(), DssError> {
        let mut state = self.state.lock();
        let idx = state
            .locks
            .iter()
            .position(|l| l.lock_type == lock_type && l.id == id);
        match idx {
            Some(idx) if state.locks[idx].is_held_by(hostname, owner_pid) => {
                state.locks.remove(idx);
                Ok(())
            }
            Some(_) | None => Err(DssError::LockNotHeld(lock_type, id.to_string())),
        }
    }

    async fn list_locks(&self, lock_type: LockType) -> Result<Vec<Lock>, DssError> {
        Ok(self
            .state
            .lock()
            .locks
            .iter()
            .filter(|l| l.lock_type == lock_type)
            .cloned()
            .collect())
    }

    async fn force_release_lock(&self, lock_type: LockType, id: &str) -> Result<(), DssError> {
        let mut state = self.state.lock();
        state
            .locks
            .retain(|l| !(l.lock_type == lock_type && l.id == id));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_dss_tests.rs"]
mod tests;
