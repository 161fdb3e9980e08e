// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fair_share` — per-technology minimum/maximum in-flight reservations for
//! format/write/read (`spec.md` §4.2). Minima are soft (consulted only when
//! there is contention elsewhere in the scheduler); this dispatcher enforces
//! only the hard maxima, since that's the part that actually gates
//! admission (I7).
//!
//! `request.technology` carries the technology the request requires,
//! resolved from the target medium's model before dispatch is attempted
//! (`spec.md` §6 `tape_model`/`drive_type` mapping). `select()` only
//! considers devices of that technology; `release()` must be called with
//! the *admitted device's* technology once the sub-request reaches a
//! terminal state, so the counter `select()` bumped is the one decremented.
//! `select()` keys its bump on the winning device's own `technology` field
//! (defaulting to the empty string when a device reports none), not on
//! `request.technology` — the two only coincide when the caller pinned a
//! technology. Callers must rebuild the `DispatchRequest` passed to
//! `release()` from the admitted device's snapshot, not replay the request
//! that was passed into `select()`.

use crate::dispatch::{DeviceSnapshot, DispatchKind, DispatchRequest, Dispatcher};
use lrs_core::DeviceId;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct TechLimits {
    pub min_format: u32,
    pub min_write: u32,
    pub min_read: u32,
    pub max_format: u32,
    pub max_write: u32,
    pub max_read: u32,
}

impl TechLimits {
    pub fn unrestricted() -> Self {
        Self {
            min_format: 0,
            min_write: 0,
            min_read: 0,
            max_format: u32::MAX,
            max_write: u32::MAX,
            max_read: u32::MAX,
        }
    }

    fn max_for(&self, kind: DispatchKind) -> u32 {
        match kind {
            DispatchKind::Format => self.max_format,
            DispatchKind::Write => self.max_write,
            DispatchKind::Read => self.max_read,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FairShareLimits {
    pub per_technology: HashMap<String, TechLimits>,
}

impl FairShareLimits {
    pub fn for_technology(&self, tech: &str) -> TechLimits {
        self.per_technology
            .get(tech)
            .copied()
            .unwrap_or_else(TechLimits::unrestricted)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TechCounters {
    format: u32,
    write: u32,
    read: u32,
}

impl TechCounters {
    fn current(&self, kind: DispatchKind) -> u32 {
        match kind {
            DispatchKind::Format => self.format,
            DispatchKind::Write => self.write,
            DispatchKind::Read => self.read,
        }
    }

    fn bump(&mut self, kind: DispatchKind) {
        match kind {
            DispatchKind::Format => self.format += 1,
            DispatchKind::Write => self.write += 1,
            DispatchKind::Read => self.read += 1,
        }
    }

    fn drop_one(&mut self, kind: DispatchKind) {
        match kind {
            DispatchKind::Format => self.format = self.format.saturating_sub(1),
            DispatchKind::Write => self.write = self.write.saturating_sub(1),
            DispatchKind::Read => self.read = self.read.saturating_sub(1),
        }
    }
}

pub struct FairShareDispatcher {
    limits: FairShareLimits,
    counters: Mutex<HashMap<String, TechCounters>>,
}

impl FairShareDispatcher {
    pub fn new(limits: FairShareLimits) -> Self {
        Self {
            limits,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Current in-flight count for `(technology, kind)` — exposed for I7
    /// assertions in tests.
    pub fn in_flight(&self, technology: &str, kind: DispatchKind) -> u32 {
        self.counters
            .lock()
            .get(technology)
            .map(|c| c.current(kind))
            .unwrap_or(0)
    }

    fn try_admit(&self, technology: &str, kind: DispatchKind) -> bool {
        let max = self.limits.for_technology(technology).max_for(kind);
        let mut counters = self.counters.lock();
        let entry = counters.entry(technology.to_string()).or_default();
        if entry.current(kind) >= max {
            return false;
        }
        entry.bump(kind);
        true
    }
}

impl Dispatcher for FairShareDispatcher {
    fn select(&self, candidates: &[DeviceSnapshot], request: &DispatchRequest) -> Option<DeviceId> {
        candidates
            .iter()
            .filter(|d| d.is_admissible())
            .filter(|d| match (&request.technology, &d.technology) {
                (Some(wanted), Some(have)) => wanted == have,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .find_map(|d| {
                let tech = d.technology.clone().unwrap_or_default();
                self.try_admit(&tech, request.kind).then(|| d.id.clone())
            })
    }

    fn release(&self, request: &DispatchRequest) {
        let tech = request.technology.as_deref().unwrap_or_default();
        if let Some(counters) = self.counters.lock().get_mut(tech) {
            counters.drop_one(request.kind);
        }
    }
}

#[cfg(test)]
#[path = "fair_share_tests.rs"]
mod tests;
