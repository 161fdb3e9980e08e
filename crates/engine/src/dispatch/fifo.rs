// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fifo` — oldest request first; scan idle devices in registration order,
//! first admissible match wins (`spec.md` §4.2).

use crate::dispatch::{DeviceSnapshot, DispatchRequest, Dispatcher};
use lrs_core::DeviceId;

pub struct FifoDispatcher;

impl Dispatcher for FifoDispatcher {
    fn select(&self, candidates: &[DeviceSnapshot], request: &DispatchRequest) -> Option<DeviceId> {
        candidates
            .iter()
            .find(|d| {
                d.is_admissible()
                    && match &request.target_medium {
                        Some(medium) => d.loaded_medium.as_ref() == Some(medium) || d.loaded_medium.is_none(),
                        None => true,
                    }
            })
            .map(|d| d.id.clone())
    }
}

#[cfg(test)]
#[path = "fifo_tests.rs"]
mod tests;
