// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device (drive) state and its operational state machine (`spec.md` §3, §4.1).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// A device's DSS key: its serial number.
    pub struct DeviceId;
}

/// Administrative lock state, shared by devices and media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Locked,
    Unlocked,
    Failed,
}

/// Operational status; see `spec.md` §4.1 for the transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    Empty,
    Loaded,
    Mounted,
    Failed,
}

impl OpStatus {
    /// Whether `self -> next` is one of the edges `spec.md` §4.1 draws. `Failed`
    /// is reachable from every state (the terminal sink); the remaining edges are
    /// the `load`/`mount`/`umount`/`unload` operations between `Empty`, `Loaded`,
    /// and `Mounted`.
    pub fn can_transition_to(self, next: OpStatus) -> bool {
        use OpStatus::*;
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Empty, Loaded) | (Loaded, Mounted) | (Mounted, Loaded) | (Loaded, Empty)
        )
    }
}

/// A media family managed by one scheduler instance (`spec.md` §2 control flow:
/// "one scheduler per media family").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Tape,
    Dir,
    Rados,
}

impl Family {
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Tape => "tape",
            Family::Dir => "dir",
            Family::Rados => "rados",
        }
    }
}

impl std::str::FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tape" => Ok(Family::Tape),
            "dir" => Ok(Family::Dir),
            "rados" => Ok(Family::Rados),
            other => Err(format!("unknown family '{other}'")),
        }
    }
}

/// A drive: the transport into which a medium is loaded (`spec.md` §3 Data Model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub family: Family,
    pub model: String,
    pub path: String,
    pub host: String,
    pub admin_status: AdminStatus,
    pub op_status: OpStatus,
    pub loaded_medium: Option<crate::medium::MediumId>,
    pub mount_path: Option<String>,
    pub technology: Option<String>,
}

impl Device {
    pub fn new(
        id: DeviceId,
        family: Family,
        model: impl Into<String>,
        path: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            id,
            family,
            model: model.into(),
            path: path.into(),
            host: host.into(),
            admin_status: AdminStatus::Unlocked,
            op_status: OpStatus::Empty,
            loaded_medium: None,
            mount_path: None,
            technology: None,
        }
    }

    /// `spec.md` §3: "While op-status = MOUNTED, loaded medium and mount path
    /// are both set."
    pub fn invariant_holds(&self) -> bool {
        if self.op_status == OpStatus::Mounted {
            self.loaded_medium.is_some() && self.mount_path.is_some()
        } else {
            true
        }
    }

    pub fn is_failed(&self) -> bool {
        self.op_status == OpStatus::Failed
    }

    pub fn mark_failed(&mut self) {
        self.op_status = OpStatus::Failed;
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
