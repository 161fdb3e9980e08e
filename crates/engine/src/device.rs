// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The device worker (`spec.md` §4.1): one cooperative async task per
//! drive, serializing every library/filesystem/DSS side-effect that touches
//! it. Realized as a single task with explicit `.await` points rather than
//! the source's dedicated OS thread — `spec.md` §9 notes the two are
//! equivalent as long as cancellation and timeouts map to the same
//! behaviors.

use crate::dispatch::{DeviceSnapshot, DispatchKind, DispatchRequest, Dispatcher};
use crate::error::EngineError;
use crate::retry::{retry_with, RetryOutcome, RetryPolicy};
use crate::sync_batch::{PendingRelease, SyncBatch, SyncThresholds};
use lrs_adapters::{ElementAddress, FilesystemAdapter, FilesystemError, LibraryAdapter, LibraryError};
use lrs_core::{Clock, Device, DeviceId, Errno, Family, FsType, Medium, MediumId, OpStatus, Response, SubRequest, SubStatus};
use lrs_dss::{DssError, DssGateway};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const WAKEUP_FLOOR: Duration = Duration::from_millis(10);

/// What a dispatched sub-request actually asks the device worker to do.
#[derive(Debug, Clone)]
pub enum WorkItem {
    Format {
        medium_id: MediumId,
        fs_type: FsType,
        unlock: bool,
    },
    ReadWrite {
        medium_id: MediumId,
        write: bool,
    },
}

pub struct PendingSubRequest {
    pub sub_request: SubRequest,
    pub work: WorkItem,
}

/// Shared, cloneable collaborators every device worker needs.
pub struct DeviceContext<L, Fs, D, C> {
    pub library: Arc<L>,
    pub filesystem: Arc<Fs>,
    pub dss: Arc<D>,
    pub clock: C,
    pub hostname: String,
    pub pid: u32,
    pub mount_prefix: String,
    pub retry_policy: RetryPolicy,
    pub sync_thresholds: SyncThresholds,
}

pub struct DeviceWorker<L, Fs, D, C> {
    ctx: DeviceContext<L, Fs, D, C>,
    device: Mutex<Device>,
    pending: Mutex<Option<PendingSubRequest>>,
    sync_batch: Mutex<SyncBatch>,
    notify: Notify,
    busy: AtomicBool,
    stopping: AtomicBool,
    stopped: AtomicBool,
}

impl<L, Fs, D, C> DeviceWorker<L, Fs, D, C>
where
    L: LibraryAdapter,
    Fs: FilesystemAdapter,
    D: DssGateway,
    C: Clock,
{
    pub fn spawn(device: Device, ctx: DeviceContext<L, Fs, D, C>) -> (Arc<Self>, JoinHandle<()>)
    where
        L: 'static,
        Fs: 'static,
        D: 'static,
        C: 'static,
    {
        let worker = Arc::new(Self {
            ctx,
            device: Mutex::new(device),
            pending: Mutex::new(None),
            sync_batch: Mutex::new(SyncBatch::new()),
            notify: Notify::new(),
            busy: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        });
        let handle = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.run().await })
        };
        (worker, handle)
    }

    pub fn id(&self) -> DeviceId {
        self.device.lock().id.clone()
    }

    pub fn snapshot(&self) -> DeviceSnapshot {
        let device = self.device.lock();
        DeviceSnapshot {
            id: device.id.clone(),
            is_idle: self.is_idle(),
            is_online: self.is_online(),
            is_sched_ready: self.is_sched_ready(),
            technology: device.technology.clone(),
            loaded_medium: device.loaded_medium.clone(),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.busy.load(Ordering::Acquire) && self.pending.lock().is_none()
    }

    pub fn is_online(&self) -> bool {
        self.device.lock().op_status != OpStatus::Failed
    }

    pub fn is_sched_ready(&self) -> bool {
        !self.stopping.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// `spec.md` §4.1: "Fails if the worker is stopping or already holds a
    /// pending sub-request."
    pub fn submit(&self, sub_request: SubRequest, work: WorkItem) -> Result<(), EngineError> {
        if !self.is_sched_ready() {
            return Err(EngineError::ShuttingDown);
        }
        let mut slot = self.pending.lock();
        if slot.is_some() {
            return Err(EngineError::DeviceFailed("worker busy".to_string()));
        }
        *slot = Some(PendingSubRequest { sub_request, work });
        drop(slot);
        self.notify.notify_one();
        Ok(())
    }

    pub fn submit_sync(&self, release: PendingRelease) {
        self.sync_batch.lock().push(release);
        self.notify.notify_one();
    }

    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    async fn run(self: Arc<Self>) {
        loop {
            self.discard_cancelled_pending();
            self.sync_batch.lock().scrub_aborted();

            let shutting_down = self.stopping.load(Ordering::Acquire);
            let sync_empty = self.sync_batch.lock().is_empty();
            let pending_empty = self.pending.lock().is_none();
            if shutting_down && !self.busy.load(Ordering::Acquire) && pending_empty && sync_empty {
                self.stopped.store(true, Ordering::Release);
                info!(device_id = %self.id(), "device worker stopped");
                return;
            }

            let needs_sync = self.sync_batch.lock().needs_sync(
                &self.ctx.clock,
                &self.ctx.sync_thresholds,
                false,
                shutting_down,
            );
            if !self.busy.load(Ordering::Acquire) && needs_sync {
                self.busy.store(true, Ordering::Release);
                self.perform_sync().await;
                self.busy.store(false, Ordering::Release);
                continue;
            }

            let has_pending = self.pending.lock().is_some();
            if !self.busy.load(Ordering::Acquire) && has_pending {
                self.busy.store(true, Ordering::Release);
                self.dispatch_pending().await;
                self.busy.store(false, Ordering::Release);
                continue;
            }

            let oldest = self.sync_batch.lock().oldest_queued_at();
            let wakeup = match oldest {
                Some(_) => WAKEUP_FLOOR,
                None => Duration::from_secs(1),
            };
            let _ = tokio::time::timeout(wakeup, self.notify.notified()).await;
        }
    }

    fn discard_cancelled_pending(&self) {
        let mut slot = self.pending.lock();
        let cancelled = slot
            .as_ref()
            .map(|p| {
                p.sub_request
                    .parent
                    .sub_status(p.sub_request.medium_idx)
                    == Some(SubStatus::Cancel)
            })
            .unwrap_or(false);
        if cancelled {
            *slot = None;
        }
    }

    async fn dispatch_pending(self: &Arc<Self>) {
        let pending = self.pending.lock().take();
        let Some(pending) = pending else { return };
        match pending.work.clone() {
            WorkItem::Format { .. } => self.handle_format(pending).await,
            WorkItem::ReadWrite { .. } => self.handle_read_write(pending).await,
        }
    }

    /// Puts the sub-request back without publishing a response, so the next
    /// wake retries it (`spec.md` §4.1: "on `-EBUSY` ... return to the main
    /// loop without consuming the sub-request").
    fn requeue(&self, pending: PendingSubRequest) {
        *self.pending.lock() = Some(pending);
    }

    fn fail_sub_request(&self, pending: &PendingSubRequest, errno: Errno) {
        let parent = &pending.sub_request.parent;
        parent.set_sub_status(pending.sub_request.medium_idx, SubStatus::Error);
        let first = parent.record_error(errno);
        if first {
            parent.cancel_remaining(pending.sub_request.medium_idx);
        }
        self.maybe_publish(parent);
    }

    fn succeed_sub_request(&self, pending: &PendingSubRequest, response: Response) {
        let parent = &pending.sub_request.parent;
        parent.set_sub_status(pending.sub_request.medium_idx, SubStatus::Done);
        if parent.all_terminal() {
            parent.publish(response);
        }
    }

    fn maybe_publish(&self, parent: &lrs_core::RequestContainer) {
        if parent.all_terminal() {
            let errno = parent.error().unwrap_or(Errno::EIO);
            parent.publish(Response::error(errno));
        }
    }

    async fn mark_device_failed(&self, errno: Errno) {
        let mut device = self.device.lock().clone();
        device.mark_failed();
        if let Err(e) = self.ctx.dss.put_device(&device).await {
            warn!(device_id = %device.id, error = %e, "failed to persist FAILED device; lock quarantined");
            return;
        }
        *self.device.lock() = device.clone();
        let _ = errno;
        let _ = self
            .ctx
            .dss
            .release_lock(
                lrs_core::LockType::Device,
                device.id.as_str(),
                &self.ctx.hostname,
                self.ctx.pid,
            )
            .await;
        error!(device_id = %device.id, "device marked FAILED");
    }

    async fn mark_medium_failed(&self, medium_id: &MediumId) -> Result<(), DssError> {
        if let Some(mut medium) = self.ctx.dss.get_medium(medium_id).await? {
            medium.mark_failed();
            self.ctx.dss.put_medium(&medium).await?;
        }
        self.ctx
            .dss
            .release_lock(
                lrs_core::LockType::Media,
                medium_id.as_str(),
                &self.ctx.hostname,
                self.ctx.pid,
            )
            .await
    }

    fn mount_point(&self, device: &Device) -> String {
        let basename = device
            .path
            .rsplit('/')
            .next()
            .unwrap_or(device.path.as_str());
        format!("{}{}", self.ctx.mount_prefix, basename)
    }

    // -- format --------------------------------------------------------

    async fn handle_format(self: &Arc<Self>, pending: PendingSubRequest) {
        let WorkItem::Format {
            medium_id,
            fs_type,
            unlock,
        } = pending.work.clone()
        else {
            unreachable!("dispatch_pending only routes Format work here")
        };

        let already_loaded = self.device.lock().loaded_medium.as_ref() == Some(&medium_id);
        if !already_loaded {
            if let Err(outcome) = self.ensure_loaded(&medium_id).await {
                return self.finish_load_failure(pending, outcome).await;
            }
        }

        let device_path = self.device.lock().path.clone();
        let result = retry_with(self.ctx.retry_policy, || {
            let fs = Arc::clone(&self.ctx.filesystem);
            let device_path = device_path.clone();
            let label = medium_id.as_str().to_string();
            async move {
                match fs.format(&device_path, &label).await {
                    Ok(()) => RetryOutcome::Success(()),
                    Err(e) => classify_fs(e),
                }
            }
        })
        .await;

        match result {
            Ok(()) => {
                if let Ok(Some(mut medium)) = self.ctx.dss.get_medium(&medium_id).await {
                    medium.fs_type = fs_type;
                    medium.advance_on_first_write();
                    let _ = self.ctx.dss.put_medium(&medium).await;
                    if unlock {
                        let _ = self
                            .ctx
                            .dss
                            .release_lock(
                                lrs_core::LockType::Media,
                                medium_id.as_str(),
                                &self.ctx.hostname,
                                self.ctx.pid,
                            )
                            .await;
                    }
                }
                self.succeed_sub_request(&pending, Response::Format);
            }
            Err(e) => {
                let _ = self.mark_medium_failed(&medium_id).await;
                self.fail_sub_request(&pending, e.errno());
            }
        }
    }

    async fn finish_load_failure(&self, pending: PendingSubRequest, outcome: LoadFailure) {
        match outcome {
            LoadFailure::RetryLater => self.requeue(pending),
            LoadFailure::DeviceFatal(e) => {
                self.mark_device_failed(e.errno()).await;
                self.fail_sub_request(&pending, e.errno());
            }
            LoadFailure::MediumFatal(e) => {
                let medium_id = match &pending.work {
                    WorkItem::Format { medium_id, .. } | WorkItem::ReadWrite { medium_id, .. } => {
                        medium_id.clone()
                    }
                };
                let _ = self.mark_medium_failed(&medium_id).await;
                self.fail_sub_request(&pending, e.errno());
            }
        }
    }

    /// Drives `empty` → `load` (skipping `empty` if nothing is loaded) so the
    /// target medium ends up loaded in the drive (`spec.md` §4.1 state
    /// machine).
    async fn ensure_loaded(&self, medium_id: &MediumId) -> Result<(), LoadFailure> {
        let currently_loaded = self.device.lock().loaded_medium.clone();
        if currently_loaded.is_some() && currently_loaded.as_ref() != Some(medium_id) {
            self.do_unload().await?;
        }
        if self.device.lock().loaded_medium.is_none() {
            self.do_load(medium_id).await?;
        }
        Ok(())
    }

    async fn do_unload(&self) -> Result<(), LoadFailure> {
        let device_path = self.device.lock().path.clone();
        let result = retry_with(self.ctx.retry_policy, || {
            let lib = Arc::clone(&self.ctx.library);
            let device_path = device_path.clone();
            async move {
                match lib.drive_lookup(&device_path).await {
                    Ok(from) => match lib.media_move(from, ElementAddress::Slot(0)).await {
                        Ok(()) => RetryOutcome::Success(()),
                        Err(e) => classify_library(e),
                    },
                    Err(e) => classify_library(e),
                }
            }
        })
        .await;
        match result {
            Ok(()) => {
                let mut device = self.device.lock();
                device.loaded_medium = None;
                device.mount_path = None;
                device.op_status = OpStatus::Empty;
                Ok(())
            }
            Err(LibraryError::Busy | LibraryError::InvalidMove) => Err(LoadFailure::RetryLater),
            Err(e) => Err(LoadFailure::DeviceFatal(EngineError::Library(e))),
        }
    }

    async fn do_load(&self, medium_id: &MediumId) -> Result<(), LoadFailure> {
        let device_path = self.device.lock().path.clone();
        let medium_id_owned = medium_id.clone();
        let result = retry_with(self.ctx.retry_policy, || {
            let lib = Arc::clone(&self.ctx.library);
            let device_path = device_path.clone();
            let medium_id = medium_id_owned.clone();
            async move {
                let to = match lib.drive_lookup(&device_path).await {
                    Ok(addr) => addr,
                    Err(e) => return classify_library(e),
                };
                match lib.media_lookup(medium_id.as_str()).await {
                    Ok(from) => match lib.media_move(from, to).await {
                        Ok(()) => RetryOutcome::Success(()),
                        Err(e) => classify_library(e),
                    },
                    Err(e) => classify_library(e),
                }
            }
        })
        .await;
        match result {
            Ok(()) => {
                let mut device = self.device.lock();
                device.loaded_medium = Some(medium_id.clone());
                device.op_status = OpStatus::Loaded;
                Ok(())
            }
            Err(LibraryError::Busy | LibraryError::InvalidMove) => Err(LoadFailure::RetryLater),
            Err(LibraryError::MediumNotFound) => {
                Err(LoadFailure::MediumFatal(EngineError::Library(LibraryError::MediumNotFound)))
            }
            Err(e) => Err(LoadFailure::DeviceFatal(EngineError::Library(e))),
        }
    }

    // -- read/write ------------------------------------------------------

    async fn handle_read_write(self: &Arc<Self>, pending: PendingSubRequest) {
        let WorkItem::ReadWrite { medium_id, write } = pending.work.clone() else {
            unreachable!("dispatch_pending only routes ReadWrite work here")
        };

        let already_mounted = {
            let device = self.device.lock();
            device.op_status == OpStatus::Mounted && device.loaded_medium.as_ref() == Some(&medium_id)
        };

        if !already_mounted {
            if let Err(outcome) = self.ensure_loaded(&medium_id).await {
                return self.finish_load_failure(pending, outcome).await;
            }
            if let Err(outcome) = self.do_mount(&medium_id).await {
                return self.finish_load_failure(pending, outcome).await;
            }
        }

        let mount_path = self.device.lock().mount_path.clone().unwrap_or_default();

        if write {
            match self.ctx.filesystem.df(&mount_path).await {
                Ok(free) if free.free_bytes == 0 => {
                    if let Ok(Some(mut medium)) = self.ctx.dss.get_medium(&medium_id).await {
                        medium.apply_free_space(0);
                        let _ = self.ctx.dss.put_medium(&medium).await;
                    }
                    let _ = self.mark_medium_failed(&medium_id).await;
                    return self.fail_sub_request(&pending, Errno::ENOSPC);
                }
                Ok(free) => {
                    let response = self.build_alloc_response(&medium_id, write, Some(free.free_bytes));
                    self.succeed_sub_request(&pending, response);
                }
                Err(e) => {
                    self.fail_sub_request(&pending, e.errno());
                }
            }
        } else {
            let response = self.build_alloc_response(&medium_id, write, None);
            self.succeed_sub_request(&pending, response);
        }
    }

    async fn do_mount(&self, medium_id: &MediumId) -> Result<(), LoadFailure> {
        let (device_path, mount_point) = {
            let device = self.device.lock();
            (device.path.clone(), self.mount_point(&device))
        };
        let result = retry_with(self.ctx.retry_policy, || {
            let fs = Arc::clone(&self.ctx.filesystem);
            let device_path = device_path.clone();
            let mount_point = mount_point.clone();
            async move {
                match fs.mount(&device_path, &mount_point).await {
                    Ok(()) => RetryOutcome::Success(()),
                    Err(e) => classify_fs(e),
                }
            }
        })
        .await;
        match result {
            Ok(()) => {
                let mut device = self.device.lock();
                device.op_status = OpStatus::Mounted;
                device.mount_path = Some(mount_point);
                let _ = medium_id;
                Ok(())
            }
            Err(e) => Err(LoadFailure::MediumFatal(EngineError::Filesystem(e))),
        }
    }

    fn build_alloc_response(&self, medium_id: &MediumId, write: bool, avail_bytes: Option<u64>) -> Response {
        let device = self.device.lock();
        let result = lrs_core::AllocResult {
            fs_type: FsType::Ltfs,
            address_type: lrs_core::AddressType::Linear,
            root_path: device.mount_path.clone().unwrap_or_default(),
            medium_id: medium_id.as_str().to_string(),
            family: device.family,
            avail_bytes,
        };
        if write {
            Response::WriteAlloc(result)
        } else {
            Response::ReadAlloc(result)
        }
    }

    // -- sync --------------------------------------------------------

    async fn perform_sync(&self) {
        let should_physically_sync = self.sync_batch.lock().should_call_medium_sync();
        let entries = self.sync_batch.lock().drain();
        if entries.is_empty() {
            return;
        }

        let medium_id = self.device.lock().loaded_medium.clone();
        let Some(medium_id) = medium_id else {
            for entry in entries {
                self.finish_release(entry, Some(Errno::ENODEV));
            }
            return;
        };

        let mut sync_ok = true;
        if should_physically_sync {
            let mount_path = self.device.lock().mount_path.clone().unwrap_or_default();
            if let Err(e) = self.ctx.filesystem.sync(&mount_path).await {
                warn!(device_id = %self.id(), error = %e, "medium sync failed");
                sync_ok = false;
            }
        }

        let total_bytes: u64 = entries.iter().map(|e| e.written_bytes).sum();
        let client_error = entries.iter().any(|e| e.client_errno.is_some());

        if sync_ok && !client_error {
            match self.ctx.dss.get_medium(&medium_id).await {
                Ok(Some(mut medium)) => {
                    medium.advance_on_first_write();
                    medium.stats.nb_obj += entries.len() as u64;
                    medium.stats.logc_spc_used += total_bytes;
                    medium.stats.phys_spc_used += total_bytes;
                    if let Err(e) = self.ctx.dss.put_medium(&medium).await {
                        warn!(device_id = %self.id(), error = %e, "failed to persist sync stats");
                        sync_ok = false;
                    }
                }
                Ok(None) => sync_ok = false,
                Err(e) => {
                    warn!(device_id = %self.id(), error = %e, "dss error during sync");
                    sync_ok = false;
                }
            }
        }

        if !sync_ok || client_error {
            let _ = self.mark_medium_failed(&medium_id).await;
            self.mark_device_failed(Errno::EIO).await;
        }

        for entry in entries {
            let errno = if sync_ok && !client_error { None } else { Some(Errno::EIO) };
            self.finish_release(entry, errno);
        }
    }

    /// Shutdown step for this device (`spec.md` §4.5 step 4): umount if
    /// mounted (preserving the loaded medium), release the medium's DSS lock
    /// then the device's DSS lock. On any error, mark the device FAILED and
    /// release only the locks whose update succeeded. Called once the
    /// worker has reached `STOPPED` (no in-flight I/O, empty sync list).
    pub async fn finalize_shutdown(&self) {
        let (op_status, mount_path, loaded_medium) = {
            let device = self.device.lock();
            (device.op_status, device.mount_path.clone(), device.loaded_medium.clone())
        };

        if op_status == OpStatus::Mounted {
            if let Some(mount_path) = mount_path {
                if let Err(e) = self.ctx.filesystem.umount(&mount_path).await {
                    warn!(device_id = %self.id(), error = %e, "umount failed during shutdown");
                    self.mark_device_failed(e.errno()).await;
                    return;
                }
            }
            let mut device = self.device.lock();
            device.op_status = OpStatus::Loaded;
            device.mount_path = None;
        }

        if let Some(medium_id) = loaded_medium {
            if let Err(e) = self
                .ctx
                .dss
                .release_lock(
                    lrs_core::LockType::Media,
                    medium_id.as_str(),
                    &self.ctx.hostname,
                    self.ctx.pid,
                )
                .await
            {
                warn!(device_id = %self.id(), medium_id = %medium_id, error = %e, "failed to release medium lock during shutdown; quarantined");
                return;
            }
        }

        if let Err(e) = self
            .ctx
            .dss
            .release_lock(
                lrs_core::LockType::Device,
                self.id().as_str(),
                &self.ctx.hostname,
                self.ctx.pid,
            )
            .await
        {
            warn!(device_id = %self.id(), error = %e, "failed to release device lock during shutdown; quarantined");
        }
    }

    fn finish_release(&self, entry: PendingRelease, errno: Option<Errno>) {
        match errno {
            None => {
                entry.request.set_sub_status(entry.sub_request_idx, SubStatus::Done);
                if entry.request.all_terminal() {
                    entry.request.publish(Response::Release);
                }
            }
            Some(errno) => {
                entry.request.set_sub_status(entry.sub_request_idx, SubStatus::Error);
                let first = entry.request.record_error(errno);
                if first {
                    entry.request.cancel_remaining(entry.sub_request_idx);
                }
                if entry.request.all_terminal() {
                    let code = entry.request.error().unwrap_or(errno);
                    entry.request.publish(Response::error(code));
                }
            }
        }
    }
}

enum LoadFailure {
    RetryLater,
    DeviceFatal(EngineError),
    MediumFatal(EngineError),
}

fn classify_library(e: LibraryError) -> RetryOutcome<(), LibraryError> {
    match e {
        LibraryError::Busy | LibraryError::InvalidMove | LibraryError::TimedOut | LibraryError::Interrupted => {
            RetryOutcome::RetryShort(e)
        }
        LibraryError::Io(_) | LibraryError::MediumNotFound | LibraryError::OpenFailed(_) => {
            RetryOutcome::Fatal(e)
        }
    }
}

fn classify_fs(e: FilesystemError) -> RetryOutcome<(), FilesystemError> {
    match e {
        FilesystemError::Busy | FilesystemError::TimedOut | FilesystemError::Interrupted => {
            RetryOutcome::RetryShort(e)
        }
        FilesystemError::Io(_)
        | FilesystemError::NotMounted
        | FilesystemError::AlreadyMounted
        | FilesystemError::FormatFailed(_) => RetryOutcome::Fatal(e),
    }
}

/// Builds a request the dispatcher should use to admit this work item
/// (`spec.md` §4.2): `Format`/`Write` dispatch kinds map 1:1, reads share the
/// `Read` kind regardless of algorithm.
pub fn dispatch_request_for(work: &WorkItem, technology: Option<String>) -> DispatchRequest {
    let (kind, target_medium) = match work {
        WorkItem::Format { medium_id, .. } => (DispatchKind::Format, Some(medium_id.clone())),
        WorkItem::ReadWrite { medium_id, write: true, .. } => (DispatchKind::Write, Some(medium_id.clone())),
        WorkItem::ReadWrite { medium_id, write: false, .. } => (DispatchKind::Read, Some(medium_id.clone())),
    };
    DispatchRequest {
        kind,
        target_medium,
        technology,
    }
}

/// Picks an admissible device for `work` from `workers` using `dispatcher`.
pub fn select_worker<'a, L, Fs, D, C>(
    dispatcher: &dyn Dispatcher,
    workers: &'a [Arc<DeviceWorker<L, Fs, D, C>>],
    work: &WorkItem,
    technology: Option<String>,
) -> Option<&'a Arc<DeviceWorker<L, Fs, D, C>>>
where
    L: LibraryAdapter,
    Fs: FilesystemAdapter,
    D: DssGateway,
    C: Clock,
{
    let snapshots: Vec<DeviceSnapshot> = workers.iter().map(|w| w.snapshot()).collect();
    let request = dispatch_request_for(work, technology);
    let chosen = dispatcher.select(&snapshots, &request)?;
    workers.iter().find(|w| w.id() == chosen)
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
