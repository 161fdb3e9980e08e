// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake filesystem adapter for tests: records every call and lets
//! a test queue canned failures per mount point before an operation
//! succeeds (T5's "mount fails twice, then succeeds" retry scenario).

use crate::filesystem::{FilesystemAdapter, FilesystemError, FreeSpace};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum FsCall {
    Mount { device_path: String, mount_point: String },
    Umount { mount_point: String },
    Format { device_path: String, label: String },
    Df { mount_point: String },
    Sync { mount_point: String },
    IsMounted { mount_point: String },
    GetLabel { device_path: String },
}

fn err_clone(e: &FilesystemError) -> FilesystemError {
    match e {
        FilesystemError::Busy => FilesystemError::Busy,
        FilesystemError::TimedOut => FilesystemError::TimedOut,
        FilesystemError::Interrupted => FilesystemError::Interrupted,
        FilesystemError::Io(m) => FilesystemError::Io(m.clone()),
        FilesystemError::NotMounted => FilesystemError::NotMounted,
        FilesystemError::AlreadyMounted => FilesystemError::AlreadyMounted,
        FilesystemError::FormatFailed(m) => FilesystemError::FormatFailed(m.clone()),
    }
}

struct State {
    calls: Vec<FsCall>,
    mounted: HashSet<String>,
    labels: HashMap<String, String>,
    free_space: FreeSpace,
    mount_errors: VecDeque<FilesystemError>,
    sync_errors: VecDeque<FilesystemError>,
}

#[derive(Clone)]
pub struct FakeFilesystemAdapter {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeFilesystemAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                mounted: HashSet::new(),
                labels: HashMap::new(),
                free_space: FreeSpace {
                    total_bytes: 1 << 30,
                    free_bytes: 1 << 30,
                },
                mount_errors: VecDeque::new(),
                sync_errors: VecDeque::new(),
            })),
        }
    }
}

impl FakeFilesystemAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<FsCall> {
        self.inner.lock().calls.clone()
    }

    /// Queue an error for the next `mount()` call. Consumed FIFO, one per
    /// call, so a test can script "fail twice then succeed".
    pub fn push_mount_error(&self, err: FilesystemError) {
        self.inner.lock().mount_errors.push_back(err);
    }

    /// Queue an error for the next `sync()` call, same FIFO convention as
    /// [`Self::push_mount_error`].
    pub fn push_sync_error(&self, err: FilesystemError) {
        self.inner.lock().sync_errors.push_back(err);
    }

    pub fn set_free_space(&self, free_space: FreeSpace) {
        self.inner.lock().free_space = free_space;
    }
}

#[async_trait]
impl FilesystemAdapter for FakeFilesystemAdapter {
    async fn mount(&self, device_path: &str, mount_point: &str) -> Result<(), FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::Mount {
            device_path: device_path.to_string(),
            mount_point: mount_point.to_string(),
        });
        if let Some(err) = inner.mount_errors.pop_front() {
            return Err(err_clone(&err));
        }
        inner.mounted.insert(mount_point.to_string());
        Ok(())
    }

    async fn umount(&self, mount_point: &str) -> Result<(), FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::Umount {
            mount_point: mount_point.to_string(),
        });
        if !inner.mounted.remove(mount_point) {
            return Err(FilesystemError::NotMounted);
        }
        Ok(())
    }

    async fn format(&self, device_path: &str, label: &str) -> Result<(), FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::Format {
            device_path: device_path.to_string(),
            label: label.to_string(),
        });
        inner
            .labels
            .insert(device_path.to_string(), label.to_string());
        Ok(())
    }

    async fn df(&self, mount_point: &str) -> Result<FreeSpace, FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::Df {
            mount_point: mount_point.to_string(),
        });
        Ok(inner.free_space)
    }

    async fn sync(&self, mount_point: &str) -> Result<(), FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::Sync {
            mount_point: mount_point.to_string(),
        });
        if let Some(err) = inner.sync_errors.pop_front() {
            return Err(err_clone(&err));
        }
        Ok(())
    }

    async fn is_mounted(&self, mount_point: &str) -> Result<bool, FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::IsMounted {
            mount_point: mount_point.to_string(),
        });
        Ok(inner.mounted.contains(mount_point))
    }

    async fn get_label(&self, device_path: &str) -> Result<Option<String>, FilesystemError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FsCall::GetLabel {
            device_path: device_path.to_string(),
        });
        Ok(inner.labels.get(device_path).cloned())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
