// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Medium (cartridge or directory) state (`spec.md` §3 Data Model).

use crate::device::{AdminStatus, Family};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// A medium's DSS key: barcode for tape, directory path for `dir`.
    pub struct MediumId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsType {
    Posix,
    Ltfs,
    Rados,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsStatus {
    Blank,
    Empty,
    Used,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Linear,
    Hash,
}

/// Usage counters updated by the sync batcher (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MediumStats {
    pub nb_obj: u64,
    pub logc_spc_used: u64,
    pub phys_spc_used: u64,
    pub phys_spc_free: u64,
    pub nb_load: u32,
    pub nb_errors: u32,
    pub last_load_epoch_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medium {
    pub id: MediumId,
    pub family: Family,
    pub model: String,
    pub admin_status: AdminStatus,
    pub fs_type: FsType,
    pub fs_status: FsStatus,
    pub address_type: AddressType,
    pub stats: MediumStats,
    pub tags: BTreeSet<String>,
}

impl Medium {
    pub fn new(
        id: MediumId,
        family: Family,
        model: impl Into<String>,
        fs_type: FsType,
        address_type: AddressType,
    ) -> Self {
        Self {
            id,
            family,
            model: model.into(),
            admin_status: AdminStatus::Unlocked,
            fs_type,
            fs_status: FsStatus::Blank,
            address_type,
            stats: MediumStats::default(),
            tags: BTreeSet::new(),
        }
    }

    /// `spec.md` I6: `phys_spc_free == 0 ⇒ fs_status == FULL` after the update.
    pub fn apply_free_space(&mut self, phys_spc_free: u64) {
        self.stats.phys_spc_free = phys_spc_free;
        if phys_spc_free == 0 {
            self.fs_status = FsStatus::Full;
        }
    }

    /// First write seen on a medium advances `BLANK`/`EMPTY` to `USED`
    /// (`spec.md` §4.3 sync update rule).
    pub fn advance_on_first_write(&mut self) {
        if matches!(self.fs_status, FsStatus::Blank | FsStatus::Empty) {
            self.fs_status = FsStatus::Used;
        }
    }

    pub fn mark_failed(&mut self) {
        self.admin_status = AdminStatus::Failed;
    }

    pub fn is_usable_for_write(&self) -> bool {
        self.admin_status == AdminStatus::Unlocked && !matches!(self.fs_status, FsStatus::Full)
    }
}

#[cfg(test)]
#[path = "medium_tests.rs"]
mod tests;
