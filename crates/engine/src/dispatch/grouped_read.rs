// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `grouped_read` — read-only; coalesce requests that would share the same
//! medium onto the same worker, to amortize mounts (`spec.md` §4.2).

use crate::dispatch::{DeviceSnapshot, DispatchKind, DispatchRequest, Dispatcher};
use lrs_core::DeviceId;

pub struct GroupedReadDispatcher;

impl Dispatcher for GroupedReadDispatcher {
    fn select(&self, candidates: &[DeviceSnapshot], request: &DispatchRequest) -> Option<DeviceId> {
        debug_assert!(
            request.kind == DispatchKind::Read,
            "grouped_read only dispatches read sub-requests"
        );

        // A device already holding the target medium is always preferred,
        // admissible or not transiently busy with another in-flight op,
        // so a second reader of the same medium piggybacks on the mount
        // already paid for.
        if let Some(target) = &request.target_medium {
            if let Some(d) = candidates
                .iter()
                .find(|d| d.is_online && d.loaded_medium.as_ref() == Some(target))
            {
                return Some(d.id.clone());
            }
        }

        candidates
            .iter()
            .find(|d| d.is_admissible())
            .map(|d| d.id.clone())
    }
}

#[cfg(test)]
#[path = "grouped_read_tests.rs"]
mod tests;
