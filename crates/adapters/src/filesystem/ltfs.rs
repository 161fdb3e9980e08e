// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FsType::Ltfs` — the `tape` family shells out to the `ltfs` userspace
//! tools (`mount.ltfs`, `mkltfs`) the way every LTFS-backed archiver does;
//! there is no Rust-native LTFS implementation to link against.

use crate::filesystem::{FilesystemAdapter, FilesystemError, FreeSpace};
use crate::subprocess::{run_with_timeout, LTFS_COMMAND_TIMEOUT};
use async_trait::async_trait;
use tokio::process::Command;

/// Shells out to the configured `mount.ltfs` / `mkltfs` / `ltfssync` binaries.
pub struct LtfsFilesystemAdapter {
    mount_cmd: String,
    umount_cmd: String,
    mkltfs_cmd: String,
    sync_cmd: String,
}

impl LtfsFilesystemAdapter {
    pub fn new(
        mount_cmd: impl Into<String>,
        umount_cmd: impl Into<String>,
        mkltfs_cmd: impl Into<String>,
        sync_cmd: impl Into<String>,
    ) -> Self {
        Self {
            mount_cmd: mount_cmd.into(),
            umount_cmd: umount_cmd.into(),
            mkltfs_cmd: mkltfs_cmd.into(),
            sync_cmd: sync_cmd.into(),
        }
    }
}

impl Default for LtfsFilesystemAdapter {
    fn default() -> Self {
        Self::new("mount.ltfs", "fusermount", "mkltfs", "ltfssync")
    }
}

fn classify(description: &str, message: String) -> FilesystemError {
    if message.contains("timed out") {
        FilesystemError::TimedOut
    } else {
        FilesystemError::Io(format!("{description}: {message}"))
    }
}

#[async_trait]
impl FilesystemAdapter for LtfsFilesystemAdapter {
    async fn mount(&self, device_path: &str, mount_point: &str) -> Result<(), FilesystemError> {
        let mut cmd = Command::new(&self.mount_cmd);
        cmd.arg(format!("-o devname={device_path}")).arg(mount_point);
        let output = run_with_timeout(cmd, LTFS_COMMAND_TIMEOUT, "mount.ltfs")
            .await
            .map_err(|e| classify("mount.ltfs", e))?;
        if !output.status.success() {
            return Err(FilesystemError::Io(format!(
                "mount.ltfs exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    async fn umount(&self, mount_point: &str) -> Result<(), FilesystemError> {
        let mut cmd = Command::new(&self.umount_cmd);
        cmd.arg("-u").arg(mount_point);
        let output = run_with_timeout(cmd, LTFS_COMMAND_TIMEOUT, "ltfs umount")
            .await
            .map_err(|e| classify("ltfs umount", e))?;
        if !output.status.success() {
            return Err(FilesystemError::Io(format!(
                "umount exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    async fn format(&self, device_path: &str, label: &str) -> Result<(), FilesystemError> {
        let mut cmd = Command::new(&self.mkltfs_cmd);
        cmd.arg("-d").arg(device_path).arg("-s").arg(label);
        let output = run_with_timeout(cmd, LTFS_COMMAND_TIMEOUT, "mkltfs")
            .await
            .map_err(|e| classify("mkltfs", e))?;
        if !output.status.success() {
            return Err(FilesystemError::FormatFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(())
    }

    async fn df(&self, mount_point: &str) -> Result<FreeSpace, FilesystemError> {
        let free_bytes = fs2::available_space(mount_point)
            .map_err(|e| FilesystemError::Io(e.to_string()))?;
        let total_bytes =
            fs2::total_space(mount_point).map_err(|e| FilesystemError::Io(e.to_string()))?;
        Ok(FreeSpace {
            total_bytes,
            free_bytes,
        })
    }

    async fn sync(&self, mount_point: &str) -> Result<(), FilesystemError> {
        let mut cmd = Command::new(&self.sync_cmd);
        cmd.arg(mount_point);
        let output = run_with_timeout(cmd, LTFS_COMMAND_TIMEOUT, "ltfssync")
            .await
            .map_err(|e| classify("ltfssync", e))?;
        if !output.status.success() {
            return Err(FilesystemError::Io(format!(
                "ltfssync exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    async fn is_mounted(&self, mount_point: &str) -> Result<bool, FilesystemError> {
        let contents = tokio::fs::read_to_string("/proc/mounts")
            .await
            .map_err(|e| FilesystemError::Io(e.to_string()))?;
        Ok(contents.lines().any(|line| line.contains(mount_point)))
    }

    async fn get_label(&self, device_path: &str) -> Result<Option<String>, FilesystemError> {
        let mut cmd = Command::new(&self.mount_cmd);
        cmd.arg("-o").arg("get_label").arg(device_path);
        let output = run_with_timeout(cmd, LTFS_COMMAND_TIMEOUT, "mount.ltfs get_label")
            .await
            .map_err(|e| classify("mount.ltfs get_label", e))?;
        if !output.status.success() {
            return Ok(None);
        }
        let label = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if label.is_empty() { None } else { Some(label) })
    }
}

#[cfg(test)]
#[path = "ltfs_tests.rs"]
mod tests;
