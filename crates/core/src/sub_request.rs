// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The portion of an allocation targeting one medium on one drive
//! (`spec.md` §3 Sub-request).

use crate::request::RequestContainer;

crate::define_id! {
    pub struct SubRequestId;
}

/// Carries a sticky "failure-on-medium" flag so dispatch can tell whether a
/// retry should avoid this medium specifically or may reselect it
/// (`spec.md` §4.1 handle_read_write).
pub struct SubRequest {
    pub id: SubRequestId,
    pub parent: RequestContainer,
    pub medium_idx: usize,
    pub failure_on_medium: bool,
}

impl SubRequest {
    pub fn new(id: SubRequestId, parent: RequestContainer, medium_idx: usize) -> Self {
        Self {
            id,
            parent,
            medium_idx,
            failure_on_medium: false,
        }
    }
}

#[cfg(test)]
#[path = "sub_request_tests.rs"]
mod tests;
