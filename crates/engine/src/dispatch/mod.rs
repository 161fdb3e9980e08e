// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! I/O scheduler / dispatch algorithms (`spec.md` §4.2): `fifo`,
//! `grouped_read`, `fair_share`. Each implements [`Dispatcher`] and is
//! selected by name from daemon config (`io_sched/<family>/dispatch_algo`).

pub mod fair_share;
pub mod fifo;
pub mod grouped_read;

use lrs_core::{DeviceId, MediumId};

/// The kind of sub-request being dispatched, for fair-share accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Format,
    Write,
    Read,
}

/// A read-only snapshot of one device's current dispatch-relevant state.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub is_idle: bool,
    pub is_online: bool,
    pub is_sched_ready: bool,
    /// Drive technology (e.g. `LTO5`), used by fair-share accounting.
    pub technology: Option<String>,
    pub loaded_medium: Option<MediumId>,
}

impl DeviceSnapshot {
    pub fn is_admissible(&self) -> bool {
        self.is_idle && self.is_online && self.is_sched_ready
    }
}

/// One pending allocation the scheduler is trying to place.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub kind: DispatchKind,
    /// The specific medium this sub-request targets, if already resolved.
    pub target_medium: Option<MediumId>,
    pub technology: Option<String>,
}

/// Chooses a device (by registration-order index into `candidates`) for a
/// pending request, or `None` if nothing admissible is available right now
/// (`spec.md` §4.2: "A request that cannot be placed is left in the
/// incoming queue").
pub trait Dispatcher: Send + Sync + 'static {
    fn select(&self, candidates: &[DeviceSnapshot], request: &DispatchRequest) -> Option<DeviceId>;

    /// Called once a sub-request placed by `select` has left the device
    /// (terminal status or cancellation), so fair-share counters can be
    /// released. No-op for algorithms that don't track in-flight counts.
    fn release(&self, _request: &DispatchRequest) {}
}

/// Resolves a dispatch algorithm name (`spec.md` §6 `io_sched/<family>/dispatch_algo`).
pub fn by_name(name: &str) -> Option<Box<dyn Dispatcher>> {
    match name {
        "fifo" => Some(Box::new(fifo::FifoDispatcher)),
        "grouped_read" => Some(Box::new(grouped_read::GroupedReadDispatcher)),
        "fair_share" => Some(Box::new(fair_share::FairShareDispatcher::new(
            fair_share::FairShareLimits::default(),
        ))),
        _ => None,
    }
}
