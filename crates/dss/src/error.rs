// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DSS errors (`spec.md` §7 "DSS errors").

use lrs_core::Errno;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DssError {
    #[error("dss io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dss serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("lock already held: {0:?}/{1}")]
    LockConflict(lrs_core::LockType, String),
    #[error("lock not held by this caller: {0:?}/{1}")]
    LockNotHeld(lrs_core::LockType, String),
}

impl DssError {
    /// `spec.md` §7: "DSS errors" map onto `EIO` at the wire boundary, except
    /// lock conflicts which are retryable (`EBUSY`).
    pub fn errno(&self) -> Errno {
        match self {
            DssError::LockConflict(..) => Errno::EBUSY,
            DssError::NotFound(_) => Errno::ENODEV,
            DssError::LockNotHeld(..) | DssError::Io(_) | DssError::Serde(_) => Errno::EIO,
        }
    }
}
