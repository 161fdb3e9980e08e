// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level errors (`spec.md` §7): the device worker's own failure
//! modes, layered over the adapter and DSS error types it composes.

use lrs_adapters::{FilesystemError, LibraryError};
use lrs_core::Errno;
use lrs_dss::DssError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("library error: {0}")]
    Library(#[from] LibraryError),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
    #[error("dss error: {0}")]
    Dss(#[from] DssError),
    #[error("device {0} failed")]
    DeviceFailed(String),
    #[error("medium {0} failed")]
    MediumFailed(String),
    #[error("medium {0} is full")]
    MediumFull(String),
    #[error("no capable device for the requested medium")]
    NoCapableDevice,
    #[error("scheduler is shutting down")]
    ShuttingDown,
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn errno(&self) -> Errno {
        match self {
            EngineError::Library(e) => e.errno(),
            EngineError::Filesystem(e) => e.errno(),
            EngineError::Dss(e) => e.errno(),
            EngineError::DeviceFailed(_) => Errno::EIO,
            EngineError::MediumFailed(_) => Errno::EIO,
            EngineError::MediumFull(_) => Errno::ENOSPC,
            EngineError::NoCapableDevice => Errno::ENODEV,
            EngineError::ShuttingDown => Errno::ECANCELED,
            EngineError::Cancelled => Errno::ECANCELED,
        }
    }
}
