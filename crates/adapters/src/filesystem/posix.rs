// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FsType::Posix` — the `dir` family's medium is a plain directory tree;
//! there is no block device to mount, so "mount" degenerates to ensuring the
//! directory exists and is writable, and "format" writes a small label file
//! recording the medium id.

use crate::filesystem::{FilesystemAdapter, FilesystemError, FreeSpace};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;

const LABEL_FILE: &str = ".lrs_label";

pub struct PosixFilesystemAdapter {
    mounted: Mutex<HashSet<String>>,
}

impl PosixFilesystemAdapter {
    pub fn new() -> Self {
        Self {
            mounted: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for PosixFilesystemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilesystemAdapter for PosixFilesystemAdapter {
    async fn mount(&self, device_path: &str, mount_point: &str) -> Result<(), FilesystemError> {
        if self.mounted.lock().contains(mount_point) {
            return Err(FilesystemError::AlreadyMounted);
        }
        let path = Path::new(device_path);
        if !path.is_dir() {
            return Err(FilesystemError::Io(format!(
                "{device_path} is not a directory"
            )));
        }
        self.mounted.lock().insert(mount_point.to_string());
        Ok(())
    }

    async fn umount(&self, mount_point: &str) -> Result<(), FilesystemError> {
        if !self.mounted.lock().remove(mount_point) {
            return Err(FilesystemError::NotMounted);
        }
        Ok(())
    }

    async fn format(&self, device_path: &str, label: &str) -> Result<(), FilesystemError> {
        let path = Path::new(device_path);
        std::fs::create_dir_all(path)
            .map_err(|e| FilesystemError::FormatFailed(e.to_string()))?;
        std::fs::write(path.join(LABEL_FILE), label)
            .map_err(|e| FilesystemError::FormatFailed(e.to_string()))?;
        Ok(())
    }

    async fn df(&self, mount_point: &str) -> Result<FreeSpace, FilesystemError> {
        let path = Path::new(mount_point);
        let free_bytes =
            fs2::available_space(path).map_err(|e| FilesystemError::Io(e.to_string()))?;
        let total_bytes =
            fs2::total_space(path).map_err(|e| FilesystemError::Io(e.to_string()))?;
        Ok(FreeSpace {
            total_bytes,
            free_bytes,
        })
    }

    async fn sync(&self, mount_point: &str) -> Result<(), FilesystemError> {
        if !self.mounted.lock().contains(mount_point) {
            return Err(FilesystemError::NotMounted);
        }
        let dir = std::fs::File::open(mount_point).map_err(|e| FilesystemError::Io(e.to_string()))?;
        dir.sync_all().map_err(|e| FilesystemError::Io(e.to_string()))
    }

    async fn is_mounted(&self, mount_point: &str) -> Result<bool, FilesystemError> {
        Ok(self.mounted.lock().contains(mount_point))
    }

    async fn get_label(&self, device_path: &str) -> Result<Option<String>, FilesystemError> {
        let label_path = Path::new(device_path).join(LABEL_FILE);
        match std::fs::read_to_string(&label_path) {
            Ok(label) => Ok(Some(label)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FilesystemError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "posix_tests.rs"]
mod tests;
