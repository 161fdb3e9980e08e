// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client request containers (`spec.md` §3 Request container, §9 "Error
//! propagation via shared request container").
//!
//! Replaces the source's raw pointer/mutex combination with a single
//! reference-counted container whose mutex guards the `rc`, the sub-request
//! statuses, and the response slot; the sub-request that observes every
//! sibling terminal publishes the response.

use crate::errno::Errno;
use crate::response::Response;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

crate::define_id! {
    /// Identifies one client request for the lifetime of its dispatch.
    pub struct RequestId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Ping,
    ReadAlloc,
    WriteAlloc,
    Release,
    Format,
    Notify,
}

/// Terminal status of one sub-request, observed by its parent container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubStatus {
    Pending,
    Done,
    Error,
    Cancel,
}

impl SubStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SubStatus::Pending)
    }
}

struct RequestInner {
    rc: Option<Errno>,
    sub_statuses: Vec<SubStatus>,
    response: Option<Response>,
}

/// Lives until either a final response is queued or all sub-requests have
/// resolved (`spec.md` §3). Cloning shares the same underlying state.
#[derive(Clone)]
pub struct RequestContainer {
    pub id: RequestId,
    pub kind: RequestKind,
    pub arrival_epoch_ms: u64,
    inner: Arc<Mutex<RequestInner>>,
}

impl RequestContainer {
    pub fn new(
        id: RequestId,
        kind: RequestKind,
        arrival_epoch_ms: u64,
        sub_request_count: usize,
    ) -> Self {
        Self {
            id,
            kind,
            arrival_epoch_ms,
            inner: Arc::new(Mutex::new(RequestInner {
                rc: None,
                sub_statuses: vec![SubStatus::Pending; sub_request_count],
                response: None,
            })),
        }
    }

    /// First error wins (`spec.md` §7). Returns `true` if this call set the
    /// error (no error had been recorded yet).
    pub fn record_error(&self, errno: Errno) -> bool {
        let mut inner = self.inner.lock();
        if inner.rc.is_none() {
            inner.rc = Some(errno);
            true
        } else {
            false
        }
    }

    pub fn error(&self) -> Option<Errno> {
        self.inner.lock().rc
    }

    pub fn set_sub_status(&self, idx: usize, status: SubStatus) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.sub_statuses.get_mut(idx) {
            *slot = status;
        }
    }

    pub fn sub_status(&self, idx: usize) -> Option<SubStatus> {
        self.inner.lock().sub_statuses.get(idx).copied()
    }

    /// Marks every still-pending sibling `CANCEL` (`spec.md` §4.1: "cancel all
    /// sibling sub-requests that are still DONE"... — in this implementation,
    /// any non-terminal sibling, since a fatal failure must stop work that
    /// hasn't resolved yet).
    pub fn cancel_remaining(&self, except_idx: usize) {
        let mut inner = self.inner.lock();
        for (i, slot) in inner.sub_statuses.iter_mut().enumerate() {
            if i != except_idx && !slot.is_terminal() {
                *slot = SubStatus::Cancel;
            }
        }
    }

    /// A parent completes only when every sub-request has a terminal status
    /// (`spec.md` §3).
    pub fn all_terminal(&self) -> bool {
        self.inner
            .lock()
            .sub_statuses
            .iter()
            .all(|s| s.is_terminal())
    }

    /// Publishes the final response; returns `false` if one was already
    /// published (exactly one caller — the last sub-request to observe
    /// completion — retires the container).
    pub fn publish(&self, response: Response) -> bool {
        let mut inner = self.inner.lock();
        if inner.response.is_some() {
            return false;
        }
        inner.response = Some(response);
        true
    }

    pub fn take_response(&self) -> Option<Response> {
        self.inner.lock().response.take()
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
