// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lrs-engine: the device worker (`spec.md` §4.1), the pluggable dispatch
//! algorithms (`spec.md` §4.2), the sync batcher (`spec.md` §4.3), the retry
//! policy (`spec.md` §9 "Retry as macro"), and the per-family scheduler that
//! ties them together (`spec.md` §2 component 9).

pub mod device;
pub mod dispatch;
pub mod error;
pub mod retry;
pub mod scheduler;
pub mod sync_batch;

pub use device::{dispatch_request_for, select_worker, DeviceContext, DeviceWorker, PendingSubRequest, WorkItem};
pub use dispatch::{by_name, DeviceSnapshot, DispatchKind, DispatchRequest, Dispatcher};
pub use error::EngineError;
pub use retry::{retry_with, RetryOutcome, RetryPolicy};
pub use scheduler::{DispatchUnit, Scheduler};
pub use sync_batch::{PendingRelease, SyncBatch, SyncThresholds};
