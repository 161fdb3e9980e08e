// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response payloads mirroring each request kind plus a terminal error variant
//! (`spec.md` §4.6).

use crate::device::Family;
use crate::errno::Errno;
use crate::medium::{AddressType, FsType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Pong,
    ReadAlloc(AllocResult),
    WriteAlloc(AllocResult),
    Release,
    Format,
    Notify,
    Error { errno: i32 },
}

/// Built by `handle_read_write` on success (`spec.md` §4.1): filesystem type,
/// address scheme, mount root, the medium actually used, and — for writes only —
/// the free space the filesystem reported after mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocResult {
    pub fs_type: FsType,
    pub address_type: AddressType,
    pub root_path: String,
    pub medium_id: String,
    pub family: Family,
    pub avail_bytes: Option<u64>,
}

impl Response {
    pub fn error(errno: Errno) -> Self {
        Response::Error {
            errno: errno.as_negative(),
        }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
