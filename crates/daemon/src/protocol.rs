// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-facing request/response DTOs (`spec.md` §4.6, §6): the concrete
//! `serde`-tagged shapes a `put`/`get`/`format` driver and the `admin` CLI's
//! `ping` subcommand speak against. Framing (version byte + length prefix)
//! lives in [`crate::protocol_wire`]; this module is the payload.

use lrs_core::{AddressType, Family, FsType, RequestKind};
use serde::{Deserialize, Serialize};

/// `spec.md` §4.6: "Request kinds handled by the core: `ping`, `read_alloc`,
/// `write_alloc`, `release`, `format`, `notify`."
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    ReadAlloc {
        family: Family,
        medium_id: Option<String>,
        technology: Option<String>,
        tag: Option<String>,
    },
    WriteAlloc {
        family: Family,
        medium_id: Option<String>,
        technology: Option<String>,
        tag: Option<String>,
    },
    Release {
        family: Family,
        device_id: String,
        medium_id: String,
        written_bytes: u64,
        /// Non-zero client-reported rc (`spec.md` §9 ambiguity #2: force a
        /// drain without syncing, mark the medium FAILED).
        client_errno: Option<i32>,
    },
    Format {
        family: Family,
        medium_id: String,
        fs_type: FsType,
        unlock: bool,
    },
    Notify(NotifyKind),
}

/// `spec.md` §4.6 "notify (device added/removed)", extended with
/// `MediumAdded` for the `admin medium register` subcommand (`SPEC_FULL.md`
/// §6) — registering a `dir`/`rados` medium out of band is the same kind of
/// administrative side-channel action as registering a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NotifyKind {
    DeviceAdded {
        family: Family,
        device_id: String,
        model: String,
        path: String,
    },
    DeviceRemoved {
        family: Family,
        device_id: String,
    },
    MediumAdded {
        family: Family,
        medium_id: String,
        model: String,
        fs_type: FsType,
        address_type: AddressType,
    },
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Ping => RequestKind::Ping,
            Request::ReadAlloc { .. } => RequestKind::ReadAlloc,
            Request::WriteAlloc { .. } => RequestKind::WriteAlloc,
            Request::Release { .. } => RequestKind::Release,
            Request::Format { .. } => RequestKind::Format,
            Request::Notify(_) => RequestKind::Notify,
        }
    }

    /// The family this request targets, used by the router to pick which
    /// per-family scheduler handles it. `Ping` has none; it is answered
    /// directly by the router without reaching any scheduler.
    pub fn family(&self) -> Option<Family> {
        match self {
            Request::Ping => None,
            Request::ReadAlloc { family, .. }
            | Request::WriteAlloc { family, .. }
            | Request::Release { family, .. }
            | Request::Format { family, .. } => Some(*family),
            Request::Notify(NotifyKind::DeviceAdded { family, .. })
            | Request::Notify(NotifyKind::DeviceRemoved { family, .. })
            | Request::Notify(NotifyKind::MediumAdded { family, .. }) => Some(*family),
        }
    }
}

pub use lrs_core::Response;

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
