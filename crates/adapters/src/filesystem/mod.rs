// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem adapter: mounts, unmounts, formats, queries free space, reads
//! labels (`spec.md` §2 component 6).

pub mod ltfs;
pub mod posix;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use lrs_core::Errno;

/// Result of a `df()`-style free-space query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeSpace {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    #[error("filesystem busy")]
    Busy,
    #[error("filesystem operation timed out")]
    TimedOut,
    #[error("filesystem operation interrupted")]
    Interrupted,
    #[error("filesystem i/o error: {0}")]
    Io(String),
    #[error("mount point not mounted")]
    NotMounted,
    #[error("mount point already mounted")]
    AlreadyMounted,
    #[error("format failed: {0}")]
    FormatFailed(String),
}

impl FilesystemError {
    pub fn errno(&self) -> Errno {
        match self {
            FilesystemError::Busy => Errno::EBUSY,
            FilesystemError::TimedOut => Errno::ETIMEDOUT,
            FilesystemError::Interrupted => Errno::EINTR,
            FilesystemError::Io(_) | FilesystemError::FormatFailed(_) => Errno::EIO,
            FilesystemError::NotMounted => Errno::ENODEV,
            FilesystemError::AlreadyMounted => Errno::EEXIST,
        }
    }
}

/// Mounts, unmounts, formats, and queries a medium's filesystem
/// (`spec.md` §2 component 6). One implementation per `FsType`
/// (`Posix`, `Ltfs`); `Rados` has no filesystem layer and is out of scope.
#[async_trait]
pub trait FilesystemAdapter: Send + Sync + 'static {
    async fn mount(&self, device_path: &str, mount_point: &str) -> Result<(), FilesystemError>;
    async fn umount(&self, mount_point: &str) -> Result<(), FilesystemError>;
    async fn format(&self, device_path: &str, label: &str) -> Result<(), FilesystemError>;
    async fn df(&self, mount_point: &str) -> Result<FreeSpace, FilesystemError>;
    /// Flushes the medium's filesystem (`spec.md` §4.3 I5: a release for a
    /// write is only acknowledged after this has been called).
    async fn sync(&self, mount_point: &str) -> Result<(), FilesystemError>;
    async fn is_mounted(&self, mount_point: &str) -> Result<bool, FilesystemError>;
    async fn get_label(&self, device_path: &str) -> Result<Option<String>, FilesystemError>;
}
