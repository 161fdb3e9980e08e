// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The I/O scheduler (`spec.md` §2 component 9, §4.2): owns one family's
//! device workers plus its incoming/retry queues, and runs the dispatch tick
//! that maps pending client allocations onto admissible devices.
//!
//! `spec.md` §9 "Open questions" #1 pins retry-queue precedence over fresh
//! arrivals; this module also resolves it concretely: the retry queue holds
//! [`DispatchUnit`]s a dispatch tick could not place on any admissible
//! device (fair-share saturation, no idle drive), not device-level I/O
//! retries — those stay inside the device worker's own `retry_with` loop
//! (`spec.md` §4.1), which this module never sees.

use crate::device::{dispatch_request_for, select_worker, DeviceWorker, WorkItem};
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::sync_batch::PendingRelease;
use lrs_adapters::{FilesystemAdapter, LibraryAdapter};
use lrs_core::{Clock, DeviceId, Errno, Family, Queue, RequestContainer, Response, SubRequest, SubStatus};
use lrs_dss::DssGateway;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DISPATCH_FLOOR: Duration = Duration::from_millis(10);

/// One sub-request awaiting placement on a device (`spec.md` §3 Sub-request,
/// §4.2 "push sub-requests to the chosen workers").
pub struct DispatchUnit {
    pub sub_request: SubRequest,
    pub work: WorkItem,
    pub technology: Option<String>,
    pub enqueued_at: Instant,
}

/// A sub-request handed to a worker, awaiting a terminal status so its
/// fair-share reservation can be released (`spec.md` §4.2 I7; the
/// `Dispatcher::release` contract in `dispatch/mod.rs`). `request` carries
/// the *admitted device's* technology, not the originally requested one —
/// they diverge whenever a caller dispatches without pinning a technology.
struct InFlight {
    parent: RequestContainer,
    medium_idx: usize,
    request: DispatchRequest,
}

/// Per-family scheduler: the incoming queue, the retry queue, the set of
/// device workers, and the dispatch algorithm selecting among them
/// (`spec.md` §2 control flow).
pub struct Scheduler<L, Fs, D, C> {
    family: Family,
    workers: RwLock<Vec<Arc<DeviceWorker<L, Fs, D, C>>>>,
    dispatcher: Box<dyn Dispatcher>,
    incoming: Queue<DispatchUnit>,
    retry: Queue<DispatchUnit>,
    in_flight: Mutex<Vec<InFlight>>,
    max_dispatch_delay: Duration,
    accepting: AtomicBool,
}

impl<L, Fs, D, C> Scheduler<L, Fs, D, C>
where
    L: LibraryAdapter,
    Fs: FilesystemAdapter,
    D: DssGateway,
    C: Clock,
{
    pub fn new(
        family: Family,
        workers: Vec<Arc<DeviceWorker<L, Fs, D, C>>>,
        dispatcher: Box<dyn Dispatcher>,
        max_dispatch_delay: Duration,
    ) -> Self {
        Self {
            family,
            workers: RwLock::new(workers),
            dispatcher,
            incoming: Queue::new(),
            retry: Queue::new(),
            in_flight: Mutex::new(Vec::new()),
            max_dispatch_delay,
            accepting: AtomicBool::new(true),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn workers(&self) -> Vec<Arc<DeviceWorker<L, Fs, D, C>>> {
        self.workers.read().clone()
    }

    pub fn worker(&self, id: &DeviceId) -> Option<Arc<DeviceWorker<L, Fs, D, C>>> {
        self.workers.read().iter().find(|w| w.id() == *id).cloned()
    }

    /// `spec.md` §4.6 `notify` (device added): registers a freshly spawned
    /// worker so dispatch and shutdown start observing it. `spec.md` §1
    /// Non-goals excludes *online reconfiguration of driver modules*, not
    /// this — adding/removing a drive from the pool is the one notify
    /// changes, never which adapter module backs an existing drive.
    pub fn add_worker(&self, worker: Arc<DeviceWorker<L, Fs, D, C>>) {
        self.workers.write().push(worker);
    }

    /// `spec.md` §4.6 `notify` (device removed). No-op if the id isn't
    /// currently registered.
    pub fn remove_worker(&self, id: &DeviceId) -> Option<Arc<DeviceWorker<L, Fs, D, C>>> {
        let mut workers = self.workers.write();
        let idx = workers.iter().position(|w| w.id() == *id)?;
        Some(workers.remove(idx))
    }

    /// `spec.md` §4.5 step 1/3: stop admitting new allocations. Existing
    /// queue contents are untouched; call [`Self::cancel_queued`] to drain them.
    pub fn stop_accepting(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// `spec.md` §4.2: "A request that cannot be placed is left in the
    /// incoming queue." Rejected outright only once shutdown has begun.
    pub fn submit(&self, unit: DispatchUnit) -> Result<(), DispatchUnit> {
        if !self.is_accepting() {
            return Err(unit);
        }
        self.incoming.push(unit);
        Ok(())
    }

    pub fn submit_release(&self, device_id: &DeviceId, release: PendingRelease) {
        if let Some(worker) = self.worker(device_id) {
            worker.submit_sync(release);
        }
    }

    /// One dispatch pass: retry queue first, then incoming (`spec.md` §4.2
    /// "The retry queue takes priority over fresh arrivals so that in-flight
    /// work drains"). Units with no admissible device right now go back to
    /// the queue they came from.
    pub fn tick(&self) {
        self.reap_completed();
        self.drain_and_try(&self.retry, true);
        self.drain_and_try(&self.incoming, false);
    }

    /// `spec.md` §4.2 I7: a placed sub-request holds its fair-share
    /// reservation until it reaches a terminal status (success, failure, or
    /// cancellation via a sibling's failure), at which point `release()`
    /// frees the slot for the next admission check. There's no completion
    /// callback from the device worker, so this polls each in-flight
    /// sub-request's status the same way `listener::await_response` polls
    /// for a published response.
    fn reap_completed(&self) {
        let mut in_flight = self.in_flight.lock();
        let mut i = 0;
        while i < in_flight.len() {
            let terminal = in_flight[i]
                .parent
                .sub_status(in_flight[i].medium_idx)
                .is_some_and(SubStatus::is_terminal);
            if terminal {
                let entry = in_flight.remove(i);
                self.dispatcher.release(&entry.request);
            } else {
                i += 1;
            }
        }
    }

    fn drain_and_try(&self, queue: &Queue<DispatchUnit>, is_retry: bool) {
        let units = queue.drain_all();
        for unit in units {
            if unit.sub_request.parent.sub_status(unit.sub_request.medium_idx) == Some(SubStatus::Cancel) {
                continue;
            }
            let workers = self.workers.read();
            match select_worker(self.dispatcher.as_ref(), workers.as_slice(), &unit.work, unit.technology.clone()) {
                Some(worker) => {
                    // Keyed on the admitted device's own technology, not
                    // `unit.technology` — `FairShareDispatcher::select` bumps
                    // under the device's resolved technology, which only
                    // coincides with the request's when the caller pinned one.
                    let request = dispatch_request_for(&unit.work, worker.snapshot().technology.clone());
                    let medium_idx = unit.sub_request.medium_idx;
                    let parent = unit.sub_request.parent.clone();
                    let work = unit.work.clone();
                    let technology = unit.technology.clone();
                    if worker.submit(unit.sub_request, unit.work).is_err() {
                        self.dispatcher.release(&request);
                        queue.push(DispatchUnit {
                            sub_request: SubRequest::new(
                                lrs_core::SubRequestId::new(format!("retry-{medium_idx}")),
                                parent,
                                medium_idx,
                            ),
                            work,
                            technology,
                            enqueued_at: Instant::now(),
                        });
                    } else {
                        self.in_flight.lock().push(InFlight { parent, medium_idx, request });
                    }
                }
                None => {
                    if unit.enqueued_at.elapsed() > self.max_dispatch_delay {
                        debug!(family = ?self.family, waited = ?unit.enqueued_at.elapsed(), "sub-request exceeds max_dispatch_delay, still no admissible device");
                    }
                    if is_retry {
                        self.retry.push(unit);
                    } else {
                        self.incoming.push(unit);
                    }
                }
            }
        }
    }

    /// `spec.md` §4.5 step 3: cancel everything still sitting in either queue
    /// with a terminal `-ECANCELED` response.
    pub fn cancel_queued(&self) {
        for unit in self.incoming.drain_all().into_iter().chain(self.retry.drain_all()) {
            let parent = unit.sub_request.parent;
            let idx = unit.sub_request.medium_idx;
            parent.set_sub_status(idx, SubStatus::Cancel);
            let first = parent.record_error(Errno::ECANCELED);
            if first {
                parent.cancel_remaining(idx);
            }
            if parent.all_terminal() {
                let errno = parent.error().unwrap_or(Errno::ECANCELED);
                parent.publish(Response::error(errno));
            }
        }
    }

    /// `spec.md` §4.5 step 2: move every worker to `STOPPING`.
    pub fn stop_workers(&self) {
        for w in self.workers.read().iter() {
            w.stop();
        }
    }

    /// Polls until every worker reaches `STOPPED` or `deadline` elapses.
    /// Returns `true` if all workers stopped in time.
    pub async fn join_workers(&self, deadline: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.workers.read().iter().all(|w| w.is_stopped()) {
                return true;
            }
            if start.elapsed() >= deadline {
                return false;
            }
            tokio::time::sleep(DISPATCH_FLOOR).await;
        }
    }

    /// `spec.md` §4.5 step 4: runs each stopped device's final umount/lock
    /// release. Best run after [`Self::join_workers`] returns `true`.
    pub async fn finalize_devices(&self) {
        let workers = self.workers.read().clone();
        for w in &workers {
            w.finalize_shutdown().await;
        }
    }

    /// Background dispatch loop: ticks every [`DISPATCH_FLOOR`] while
    /// `running` holds, bounding how long a placeable request waits once an
    /// admissible device frees up (`spec.md` §4.2 fairness: "no sub-request
    /// is starved longer than `max_dispatch_delay`").
    pub async fn run(self: Arc<Self>, running: Arc<AtomicBool>) {
        info!(family = ?self.family, max_dispatch_delay = ?self.max_dispatch_delay, "scheduler dispatch loop started");
        while running.load(Ordering::Acquire) {
            self.tick();
            tokio::time::sleep(DISPATCH_FLOOR).await;
        }
        debug!(family = ?self.family, "scheduler dispatch loop stopped");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
