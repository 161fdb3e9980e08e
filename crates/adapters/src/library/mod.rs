// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Library adapter: the media-changer capability (`spec.md` §2 component 5,
//! out of scope at the SCSI-transport level — the core only needs the
//! `open/close/drive_lookup/media_lookup/media_move/scan` operation set).

pub mod dummy;
pub mod tlc;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use lrs_core::Errno;

/// An element address inside a media changer: a drive slot or a storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementAddress {
    Drive(u16),
    Slot(u16),
}

impl ElementAddress {
    pub fn is_drive(self) -> bool {
        matches!(self, ElementAddress::Drive(_))
    }
}

/// One row of a `scan()` inventory sweep.
#[derive(Debug, Clone)]
pub struct InventoryEntry {
    pub address: ElementAddress,
    pub medium_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("scsi busy")]
    Busy,
    #[error("scsi operation timed out")]
    TimedOut,
    #[error("scsi operation interrupted")]
    Interrupted,
    #[error("scsi i/o error: {0}")]
    Io(String),
    /// The changer refused a move between two drive elements (`spec.md` §7:
    /// "library returns `-EINVAL` for two drive endpoints"). The engine's
    /// retry classifier reclassifies this to `-EBUSY`/retry-later.
    #[error("move between two drive elements refused")]
    InvalidMove,
    #[error("no medium found at the requested address")]
    MediumNotFound,
    #[error("library open failed: {0}")]
    OpenFailed(String),
}

impl LibraryError {
    /// Maps each variant onto the errno scale the wire protocol and DSS use.
    /// `InvalidMove` reports `EBUSY` directly here; the raw `-EINVAL` the spec
    /// describes is an implementation detail of the reclassification, not a
    /// code this adapter surfaces to callers.
    pub fn errno(&self) -> Errno {
        match self {
            LibraryError::Busy | LibraryError::InvalidMove => Errno::EBUSY,
            LibraryError::TimedOut => Errno::ETIMEDOUT,
            LibraryError::Interrupted => Errno::EINTR,
            LibraryError::Io(_) | LibraryError::OpenFailed(_) => Errno::EIO,
            LibraryError::MediumNotFound => Errno::ENODEV,
        }
    }
}

/// Opens a handle to the media changer; looks up drive/medium addresses;
/// moves media; scans inventory (`spec.md` §2 component 5).
#[async_trait]
pub trait LibraryAdapter: Send + Sync + 'static {
    async fn open(&self) -> Result<(), LibraryError>;
    async fn close(&self) -> Result<(), LibraryError>;
    async fn drive_lookup(&self, drive_path: &str) -> Result<ElementAddress, LibraryError>;
    async fn media_lookup(&self, medium_id: &str) -> Result<ElementAddress, LibraryError>;
    async fn media_move(
        &self,
        from: ElementAddress,
        to: ElementAddress,
    ) -> Result<(), LibraryError>;
    async fn scan(&self) -> Result<Vec<InventoryEntry>, LibraryError>;

    /// Downcast hook so a caller holding only `dyn LibraryAdapter` can reach
    /// adapter-specific setup (`dummy::DummyLibraryAdapter::register_drive`)
    /// when a drive/medium is added at runtime. No-op for adapters (`tlc`)
    /// that discover their inventory from live hardware instead.
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
