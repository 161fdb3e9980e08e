// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake library adapter for tests: records every call and lets a
//! test queue up canned failures before a call succeeds (e.g. T5's "EBUSY
//! twice then success" retry scenario).

use crate::library::{ElementAddress, InventoryEntry, LibraryAdapter, LibraryError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded library call.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryCall {
    Open,
    Close,
    DriveLookup { drive_path: String },
    MediaLookup { medium_id: String },
    MediaMove {
        from: ElementAddress,
        to: ElementAddress,
    },
    Scan,
}

fn err_clone(e: &LibraryError) -> LibraryError {
    match e {
        LibraryError::Busy => LibraryError::Busy,
        LibraryError::TimedOut => LibraryError::TimedOut,
        LibraryError::Interrupted => LibraryError::Interrupted,
        LibraryError::Io(m) => LibraryError::Io(m.clone()),
        LibraryError::InvalidMove => LibraryError::InvalidMove,
        LibraryError::MediumNotFound => LibraryError::MediumNotFound,
        LibraryError::OpenFailed(m) => LibraryError::OpenFailed(m.clone()),
    }
}

struct State {
    calls: Vec<LibraryCall>,
    drives: HashMap<String, ElementAddress>,
    media: HashMap<String, ElementAddress>,
    inventory: Vec<InventoryEntry>,
    move_errors: VecDeque<LibraryError>,
}

#[derive(Clone)]
pub struct FakeLibraryAdapter {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeLibraryAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                drives: HashMap::new(),
                media: HashMap::new(),
                inventory: Vec::new(),
                move_errors: VecDeque::new(),
            })),
        }
    }
}

impl FakeLibraryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LibraryCall> {
        self.inner.lock().calls.clone()
    }

    pub fn register_drive(&self, drive_path: &str, address: ElementAddress) {
        self.inner
            .lock()
            .drives
            .insert(drive_path.to_string(), address);
    }

    pub fn register_medium(&self, medium_id: &str, address: ElementAddress) {
        self.inner
            .lock()
            .media
            .insert(medium_id.to_string(), address);
    }

    pub fn set_inventory(&self, entries: Vec<InventoryEntry>) {
        self.inner.lock().inventory = entries;
    }

    /// Queue an error to be returned by the next `media_move()` call instead
    /// of succeeding. Errors are consumed in FIFO order, one per call.
    pub fn push_move_error(&self, err: LibraryError) {
        self.inner.lock().move_errors.push_back(err);
    }
}

#[async_trait]
impl LibraryAdapter for FakeLibraryAdapter {
    async fn open(&self) -> Result<(), LibraryError> {
        self.inner.lock().calls.push(LibraryCall::Open);
        Ok(())
    }

    async fn close(&self) -> Result<(), LibraryError> {
        self.inner.lock().calls.push(LibraryCall::Close);
        Ok(())
    }

    async fn drive_lookup(&self, drive_path: &str) -> Result<ElementAddress, LibraryError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LibraryCall::DriveLookup {
            drive_path: drive_path.to_string(),
        });
        inner
            .drives
            .get(drive_path)
            .copied()
            .ok_or(LibraryError::MediumNotFound)
    }

    async fn media_lookup(&self, medium_id: &str) -> Result<ElementAddress, LibraryError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LibraryCall::MediaLookup {
            medium_id: medium_id.to_string(),
        });
        inner
            .media
            .get(medium_id)
            .copied()
            .ok_or(LibraryError::MediumNotFound)
    }

    async fn media_move(
        &self,
        from: ElementAddress,
        to: ElementAddress,
    ) -> Result<(), LibraryError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LibraryCall::MediaMove { from, to });
        if let Some(err) = inner.move_errors.pop_front() {
            return Err(err_clone(&err));
        }
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<InventoryEntry>, LibraryError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LibraryCall::Scan);
        Ok(inner.inventory.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
