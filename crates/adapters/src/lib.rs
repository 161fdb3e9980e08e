// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the two external collaborators a device worker drives: the
//! media changer (`library`) and the medium's own filesystem (`filesystem`).
//! `subprocess` is the shared timeout wrapper both use to shell out.

pub mod filesystem;
pub mod library;
pub mod subprocess;

pub use filesystem::{FilesystemAdapter, FilesystemError, FreeSpace};
pub use library::{ElementAddress, InventoryEntry, LibraryAdapter, LibraryError};

use async_trait::async_trait;

/// Lets a boxed trait object satisfy the same generic bound as a concrete
/// adapter. The daemon spawns one `library`/`filesystem` implementation per
/// media family (`tlc`+`ltfs` for `tape`, `dummy`+`posix` for `dir`) but
/// `DeviceWorker`/`Scheduler` are written against a single generic `L`/`Fs`
/// pair — boxing lets both families share one monomorphic worker type
/// instead of duplicating it per family (`spec.md` §9 "Dynamic dispatch for
/// adapters": a registry maps key to constructor, the value type is this box).
#[async_trait]
impl LibraryAdapter for Box<dyn LibraryAdapter> {
    async fn open(&self) -> Result<(), LibraryError> {
        (**self).open().await
    }
    async fn close(&self) -> Result<(), LibraryError> {
        (**self).close().await
    }
    async fn drive_lookup(&self, drive_path: &str) -> Result<ElementAddress, LibraryError> {
        (**self).drive_lookup(drive_path).await
    }
    async fn media_lookup(&self, medium_id: &str) -> Result<ElementAddress, LibraryError> {
        (**self).media_lookup(medium_id).await
    }
    async fn media_move(
        &self,
        from: ElementAddress,
        to: ElementAddress,
    ) -> Result<(), LibraryError> {
        (**self).media_move(from, to).await
    }
    async fn scan(&self) -> Result<Vec<InventoryEntry>, LibraryError> {
        (**self).scan().await
    }
    fn as_any(&self) -> &dyn std::any::Any {
        (**self).as_any()
    }
}

#[async_trait]
impl FilesystemAdapter for Box<dyn FilesystemAdapter> {
    async fn mount(&self, device_path: &str, mount_point: &str) -> Result<(), FilesystemError> {
        (**self).mount(device_path, mount_point).await
    }
    async fn umount(&self, mount_point: &str) -> Result<(), FilesystemError> {
        (**self).umount(mount_point).await
    }
    async fn format(&self, device_path: &str, label: &str) -> Result<(), FilesystemError> {
        (**self).format(device_path, label).await
    }
    async fn df(&self, mount_point: &str) -> Result<FreeSpace, FilesystemError> {
        (**self).df(mount_point).await
    }
    async fn sync(&self, mount_point: &str) -> Result<(), FilesystemError> {
        (**self).sync(mount_point).await
    }
    async fn is_mounted(&self, mount_point: &str) -> Result<bool, FilesystemError> {
        (**self).is_mounted(mount_point).await
    }
    async fn get_label(&self, device_path: &str) -> Result<Option<String>, FilesystemError> {
        (**self).get_label(device_path).await
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use filesystem::fake::{FakeFilesystemAdapter, FsCall};
#[cfg(any(test, feature = "test-support"))]
pub use library::fake::{FakeLibraryAdapter, LibraryCall};
