// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: config loading, startup (lock acquisition, DSS load,
//! lock-recovery reconciliation, worker spawning) and the bounded shutdown
//! sequencer (`spec.md` §4.4, §4.5). Grounded on
//! `oj-daemon::lifecycle::{Config, DaemonState, startup, shutdown}`'s shape:
//! a typed config, a runtime state struct owning every spawned task, and two
//! associated functions bracketing the process's useful lifetime.

pub mod config;
pub mod reconcile;

pub use config::Config;

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use lrs_adapters::filesystem::ltfs::LtfsFilesystemAdapter;
use lrs_adapters::filesystem::posix::PosixFilesystemAdapter;
use lrs_adapters::library::dummy::DummyLibraryAdapter;
use lrs_adapters::library::tlc::TlcLibraryAdapter;
use lrs_adapters::{FilesystemAdapter, LibraryAdapter};
use lrs_core::{Clock, Device, Family, Lock, LockType, Medium, SystemClock};
use lrs_dss::{DssError, DssGateway, FileDss};
use lrs_engine::{DeviceContext, DeviceWorker, Scheduler};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::env;

/// One boxed trait object per adapter capability. `tape` (`tlc` + `ltfs`)
/// and `dir` (`dummy` + `posix`) then share a single monomorphic
/// `DeviceWorker`/`Scheduler` instantiation instead of one per family
/// (`spec.md` §9 "Dynamic dispatch for adapters": a registry maps key to
/// constructor; this is the value type the registry produces).
pub type Lib = Box<dyn LibraryAdapter>;
pub type FsAdapter = Box<dyn FilesystemAdapter>;
pub type LrsContext = DeviceContext<Lib, FsAdapter, FileDss, SystemClock>;
pub type LrsWorker = DeviceWorker<Lib, FsAdapter, FileDss, SystemClock>;
pub type LrsScheduler = Scheduler<Lib, FsAdapter, FileDss, SystemClock>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("dss error: {0}")]
    Dss(#[from] DssError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{} is not set", env::PID_FILEPATH_VAR)]
    NoPidFilepath,
    #[error("another instance is already running (lockfile held)")]
    AlreadyRunning,
    #[error("no device available")]
    NoDeviceAvailable,
}

impl LifecycleError {
    /// `spec.md` §6: "Exit codes: 0 on clean stop, EEXIST on duplicate lock,
    /// 1 on misconfiguration, ENXIO when no device is available."
    pub fn exit_code(&self) -> i32 {
        match self {
            LifecycleError::AlreadyRunning => libc::EEXIST,
            LifecycleError::NoDeviceAvailable => libc::ENXIO,
            _ => 1,
        }
    }
}

struct FamilyAdapters {
    library: Arc<Lib>,
    filesystem: Arc<FsAdapter>,
}

/// `devices`/`media` are this family's rows already on file at startup, used
/// to pre-populate `DummyLibraryAdapter`'s slot table (`spec.md` §2 component
/// 5: the `dir`/`rados` families have no physical changer, so drive/medium
/// addresses have to come from somewhere other than a SCSI inventory scan).
fn build_adapters(family: Family, config: &Config, devices: &[Device], media: &[Medium]) -> FamilyAdapters {
    match family {
        Family::Tape => FamilyAdapters {
            library: Arc::new(Box::new(TlcLibraryAdapter::new(
                config.tlc.hostname.clone(),
                config.tlc.port,
                Duration::from_millis(config.scsi.query_timeout_ms),
            )) as Box<dyn LibraryAdapter>),
            filesystem: Arc::new(Box::new(LtfsFilesystemAdapter::new(
                config
                    .ltfs
                    .cmd_mount
                    .clone()
                    .unwrap_or_else(|| "mount.ltfs".to_string()),
                config
                    .ltfs
                    .cmd_umount
                    .clone()
                    .unwrap_or_else(|| "fusermount".to_string()),
                config
                    .ltfs
                    .cmd_mkltfs
                    .clone()
                    .unwrap_or_else(|| "mkltfs".to_string()),
                config
                    .ltfs
                    .cmd_sync
                    .clone()
                    .unwrap_or_else(|| "ltfssync".to_string()),
            )) as Box<dyn FilesystemAdapter>),
        },
        Family::Dir | Family::Rados => {
            let dummy = DummyLibraryAdapter::new();
            for (idx, device) in devices.iter().enumerate() {
                dummy.register_drive(&device.path, idx as u16);
            }
            for (idx, medium) in media.iter().enumerate() {
                dummy.register_medium(medium.id.as_str(), idx as u16);
            }
            FamilyAdapters {
                library: Arc::new(Box::new(dummy) as Box<dyn LibraryAdapter>),
                filesystem: Arc::new(
                    Box::new(PosixFilesystemAdapter::new()) as Box<dyn FilesystemAdapter>
                ),
            }
        }
    }
}

/// Everything the running daemon owns: the loaded config, the DSS handle,
/// one scheduler (and its dispatch-loop task) per configured family, and the
/// single-instance lockfile held for the process's lifetime.
pub struct DaemonState {
    pub config: Config,
    pub dss: Arc<FileDss>,
    pub hostname: String,
    pub pid: u32,
    schedulers: HashMap<Family, Arc<LrsScheduler>>,
    family_adapters: HashMap<Family, FamilyAdapters>,
    scheduler_tasks: Mutex<Vec<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
    lockfile: Mutex<Option<File>>,
    lockfile_path: PathBuf,
}

impl DaemonState {
    /// `spec.md` §4.4: lock-recovery reconciliation runs to completion
    /// before client connections are accepted. Acquires the single-instance
    /// lockfile first (`spec.md` §6 "Duplicate start exits with EEXIST"),
    /// then loads the DSS, reconciles locks, and spawns one scheduler plus
    /// its device workers per configured family.
    pub async fn startup(config: Config) -> Result<Arc<DaemonState>, LifecycleError> {
        let lockfile_path = config.lrs.lock_file.clone();
        let lockfile = acquire_lockfile(&lockfile_path)?;

        let hostname = env::hostname();
        let pid = std::process::id();

        let dss = Arc::new(FileDss::open(config.lrs.dss_path.clone())?);
        let devices = dss.list_devices().await?;
        let media = dss.list_media().await?;

        if devices.is_empty() {
            return Err(LifecycleError::NoDeviceAvailable);
        }

        reconcile::reconcile_locks(dss.as_ref(), &hostname, &devices, &media).await?;

        let families = config.families()?;
        let running = Arc::new(AtomicBool::new(true));
        let mut schedulers = HashMap::new();
        let mut family_adapters = HashMap::new();
        let mut scheduler_tasks = Vec::new();

        for family in families {
            let family_devices: Vec<_> = devices.iter().filter(|d| d.family == family).cloned().collect();
            let family_media: Vec<_> = media.iter().filter(|m| m.family == family).cloned().collect();
            let adapters = build_adapters(family, &config, &family_devices, &family_media);
            let dispatcher = config.dispatcher_for(family)?;
            let retry_policy = config.retry_policy();
            let sync_thresholds = config.sync_thresholds(family);

            let mut workers = Vec::new();
            for device in devices.iter().filter(|d| d.family == family) {
                let mut device = device.clone();
                device.technology = config.resolve_technology(&device.model);

                // A device worker owns its drive for the process's lifetime;
                // the matching release happens in `DeviceWorker::mark_device_failed`
                // or `finalize_shutdown`, never here. Reconciliation already
                // cleared this host's and every orphan's rows, so a conflict
                // here means another live host genuinely owns this drive.
                if let Err(e) = dss
                    .acquire_lock(Lock::new(
                        LockType::Device,
                        device.id.as_str(),
                        hostname.clone(),
                        pid,
                        SystemClock.epoch_ms(),
                    ))
                    .await
                {
                    warn!(device_id = %device.id, error = %e, "device lock held elsewhere, not spawning a worker for it");
                    continue;
                }

                let ctx = LrsContext {
                    library: Arc::clone(&adapters.library),
                    filesystem: Arc::clone(&adapters.filesystem),
                    dss: Arc::clone(&dss),
                    clock: SystemClock,
                    hostname: hostname.clone(),
                    pid,
                    mount_prefix: config.lrs.mount_prefix.clone(),
                    retry_policy,
                    sync_thresholds,
                };
                let (worker, handle) = LrsWorker::spawn(device, ctx);
                workers.push(worker);
                // The worker's run loop lives for the process lifetime; its
                // handle is kept only so shutdown can abort a wedged task
                // that missed the `join_workers` deadline.
                scheduler_tasks.push(handle);
            }

            let scheduler = Arc::new(LrsScheduler::new(
                family,
                workers,
                dispatcher,
                config.max_dispatch_delay(),
            ));
            let task = tokio::spawn(Arc::clone(&scheduler).run(Arc::clone(&running)));
            scheduler_tasks.push(task);
            schedulers.insert(family, scheduler);
            family_adapters.insert(family, adapters);
        }

        info!(families = schedulers.len(), devices = devices.len(), "lock recovery complete, schedulers started");

        Ok(Arc::new(DaemonState {
            config,
            dss,
            hostname,
            pid,
            schedulers,
            family_adapters,
            scheduler_tasks: Mutex::new(scheduler_tasks),
            running,
            lockfile: Mutex::new(Some(lockfile)),
            lockfile_path,
        }))
    }

    pub fn scheduler(&self, family: Family) -> Option<Arc<LrsScheduler>> {
        self.schedulers.get(&family).cloned()
    }

    pub fn schedulers(&self) -> impl Iterator<Item = &Arc<LrsScheduler>> {
        self.schedulers.values()
    }

    /// Builds a fresh [`LrsContext`] for `family`, used by `notify`
    /// (device added) to spawn one more worker into a running scheduler.
    pub fn context_for(&self, family: Family) -> Option<LrsContext> {
        let adapters = self.family_adapters.get(&family)?;
        Some(LrsContext {
            library: Arc::clone(&adapters.library),
            filesystem: Arc::clone(&adapters.filesystem),
            dss: Arc::clone(&self.dss),
            clock: SystemClock,
            hostname: self.hostname.clone(),
            pid: self.pid,
            mount_prefix: self.config.lrs.mount_prefix.clone(),
            retry_policy: self.config.retry_policy(),
            sync_thresholds: self.config.sync_thresholds(family),
        })
    }

    /// Registers a newly notified drive with `family`'s library adapter, if
    /// it's a `DummyLibraryAdapter` (the `dir`/`rados` families have no
    /// SCSI inventory scan to pick the drive up automatically). A no-op for
    /// `tape`, whose `tlc` adapter discovers drives from live hardware.
    pub fn register_dummy_drive(&self, family: Family, path: &str, slot: u16) {
        if let Some(adapters) = self.family_adapters.get(&family) {
            if let Some(dummy) = adapters.library.as_any().downcast_ref::<DummyLibraryAdapter>() {
                dummy.register_drive(path, slot);
            }
        }
    }

    /// The medium-registration counterpart of [`Self::register_dummy_drive`].
    pub fn register_dummy_medium(&self, family: Family, medium_id: &str, slot: u16) {
        if let Some(adapters) = self.family_adapters.get(&family) {
            if let Some(dummy) = adapters.library.as_any().downcast_ref::<DummyLibraryAdapter>() {
                dummy.register_medium(medium_id, slot);
            }
        }
    }

    /// `spec.md` §4.5 steps 2-5 (step 1, closing the listener, is the
    /// caller's job — see `crate::listener::serve`'s select against a
    /// shutdown signal). Bounded by `deadline`; workers that haven't
    /// reached `STOPPED` by then are left as-is and picked up by the next
    /// start's reconciliation, per `spec.md` §4.5 "Hard deadline".
    pub async fn shutdown(&self, deadline: Duration) {
        self.running.store(false, Ordering::Release);

        for scheduler in self.schedulers.values() {
            scheduler.stop_accepting();
        }
        for scheduler in self.schedulers.values() {
            scheduler.cancel_queued();
        }
        for scheduler in self.schedulers.values() {
            scheduler.stop_workers();
        }

        let deadline_per_family = deadline / (self.schedulers.len().max(1) as u32);
        for scheduler in self.schedulers.values() {
            if !scheduler.join_workers(deadline_per_family).await {
                warn!(family = ?scheduler.family(), "workers did not reach STOPPED before the shutdown deadline");
            }
            scheduler.finalize_devices().await;
        }

        for task in self.scheduler_tasks.lock().drain(..) {
            task.abort();
        }

        if let Some(lockfile) = self.lockfile.lock().take() {
            let _ = fs2::FileExt::unlock(&lockfile);
            drop(lockfile);
            let _ = std::fs::remove_file(&self.lockfile_path);
        }
        if let Ok(pid_path) = env::pid_filepath() {
            let _ = std::fs::remove_file(pid_path);
        }
    }
}

fn acquire_lockfile(path: &std::path::Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(path)?;
    file.try_lock_exclusive()
        .map_err(|_| LifecycleError::AlreadyRunning)?;
    Ok(file)
}
