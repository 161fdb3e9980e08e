// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LibType::Dummy` — the `dir` family has no physical media changer. Drives
//! and media are both addressed by the same directory path, and a "move" is
//! vacuously instantaneous: there is no transport to wait on.

use crate::library::{ElementAddress, InventoryEntry, LibraryAdapter, LibraryError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

struct Slot {
    address: ElementAddress,
    medium_id: Option<String>,
}

pub struct DummyLibraryAdapter {
    slots: Mutex<HashMap<String, Slot>>,
}

impl DummyLibraryAdapter {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a drive path as a notional changer slot, called when a
    /// `dir`-family drive is added to the daemon's config.
    pub fn register_drive(&self, drive_path: &str, drive_no: u16) {
        self.slots.lock().insert(
            drive_path.to_string(),
            Slot {
                address: ElementAddress::Drive(drive_no),
                medium_id: None,
            },
        );
    }

    pub fn register_medium(&self, medium_id: &str, slot_no: u16) {
        self.slots.lock().insert(
            medium_id.to_string(),
            Slot {
                address: ElementAddress::Slot(slot_no),
                medium_id: Some(medium_id.to_string()),
            },
        );
    }
}

impl Default for DummyLibraryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryAdapter for DummyLibraryAdapter {
    async fn open(&self) -> Result<(), LibraryError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), LibraryError> {
        Ok(())
    }

    async fn drive_lookup(&self, drive_path: &str) -> Result<ElementAddress, LibraryError> {
        self.slots
            .lock()
            .get(drive_path)
            .map(|s| s.address)
            .ok_or(LibraryError::MediumNotFound)
    }

    async fn media_lookup(&self, medium_id: &str) -> Result<ElementAddress, LibraryError> {
        self.slots
            .lock()
            .get(medium_id)
            .map(|s| s.address)
            .ok_or(LibraryError::MediumNotFound)
    }

    async fn media_move(
        &self,
        _from: ElementAddress,
        _to: ElementAddress,
    ) -> Result<(), LibraryError> {
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<InventoryEntry>, LibraryError> {
        Ok(self
            .slots
            .lock()
            .values()
            .map(|s| InventoryEntry {
                address: s.address,
                medium_id: s.medium_id.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "dummy_tests.rs"]
mod tests;
