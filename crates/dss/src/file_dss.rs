// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FileDss` — a JSON-file-backed `DssGateway`. The "real" relational
//! metadata store is out of scope (`spec.md` §1); this is the working
//! default implementation behind the thin data-access interface, not a
//! stand-in for one. Every mutation is written atomically: serialize to a
//! `.tmp` sibling, `fsync`, then `rename` over the live file, with corrupt
//! files rotated to `.bak` rather than losing state.

use crate::error::DssError;
use crate::gateway::DssGateway;
use async_trait::async_trait;
use lrs_core::{Device, DeviceId, Lock, LockType, Medium, MediumId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DssFile {
    devices: HashMap<String, Device>,
    media: HashMap<String, Medium>,
    locks: Vec<Lock>,
}

pub struct FileDss {
    path: PathBuf,
    state: Mutex<DssFile>,
}

impl FileDss {
    /// Loads `path` if it exists, starting from an empty store otherwise.
    /// A corrupt file is rotated to `.bak` and treated as empty, the same
    /// recovery the snapshot loader uses for a corrupt file on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DssError> {
        let path = path.into();
        let state = load_or_recover(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &DssFile) -> Result<(), DssError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, state)?;
            let file = writer
                .into_inner()
                .map_err(|e| DssError::Io(e.into_error()))?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn load_or_recover(path: &Path) -> Result<DssFile, DssError> {
    if !path.exists() {
        return Ok(DssFile::default());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    match serde_json::from_reader(reader) {
        Ok(state) => Ok(state),
        Err(e) => {
            let bak_path = rotate_bak_path(path);
            warn!(
                error = %e,
                path = %path.display(),
                bak = %bak_path.display(),
                "corrupt dss file, moving to .bak and starting fresh",
            );
            fs::rename(path, &bak_path)?;
            Ok(DssFile::default())
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[async_trait]
impl DssGateway for FileDss {
    async fn get_device(&self, id: &DeviceId) -> Result<Option<Device>, DssError> {
        Ok(self.state.lock().devices.get(id.as_str()).cloned())
    }

    async fn put_device(&self, device: &Device) -> Result<(), DssError> {
        let mut state = self.state.lock();
        state
            .devices
            .insert(device.id.as_str().to_string(), device.clone());
        self.persist(&state)
    }

    async fn list_devices(&self) -> Result<Vec<Device>, DssError> {
        Ok(self.state.lock().devices.values().cloned().collect())
    }

    async fn get_medium(&self, id: &MediumId) -> Result<Option<Medium>, DssError> {
        Ok(self.state.lock().media.get(id.as_str()).cloned())
    }

    async fn put_medium(&self, medium: &Medium) -> Result<(), DssError> {
        let mut state = self.state.lock();
        state
            .media
            .insert(medium.id.as_str().to_string(), medium.clone());
        self.persist(&state)
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
        self.persist(&state)
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
                self.persist(&state)
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
        let before = state.locks.len();
        state
            .locks
            .retain(|l| !(l.lock_type == lock_type && l.id == id));
        if state.locks.len() == before {
            return Ok(());
        }
        self.persist(&state)
    }
}

#[cfg(test)]
#[path = "file_dss_tests.rs"]
mod tests;
