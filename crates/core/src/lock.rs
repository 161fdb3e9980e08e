// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DSS lock rows (`spec.md` §3 Lock, §4.4 Lock recovery).

use serde::{Deserialize, Serialize};

/// The three lock kinds the DSS tracks, keyed by `(lock_type, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    Device,
    Media,
    MediaUpdate,
}

/// An advisory lock row: unique on `(lock_type, id)`. Only the holder
/// (matching `hostname` + `owner_pid`) may release it; locks are never a
/// distributed-consensus primitive (`spec.md` §1 Non-goals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub lock_type: LockType,
    pub id: String,
    pub hostname: String,
    pub owner_pid: u32,
    pub timestamp: u64,
}

impl Lock {
    pub fn new(
        lock_type: LockType,
        id: impl Into<String>,
        hostname: impl Into<String>,
        owner_pid: u32,
        timestamp: u64,
    ) -> Self {
        Self {
            lock_type,
            id: id.into(),
            hostname: hostname.into(),
            owner_pid,
            timestamp,
        }
    }

    pub fn is_held_by(&self, hostname: &str, owner_pid: u32) -> bool {
        self.hostname == hostname && self.owner_pid == owner_pid
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
