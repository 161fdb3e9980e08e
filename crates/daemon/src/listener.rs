// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request router (`spec.md` §4.6, §6): accepts client connections over
//! a Unix socket or TCP, frames requests/responses through
//! [`crate::protocol_wire`], and turns each [`Request`] into work against
//! the right family's [`lrs_engine::Scheduler`].
//!
//! Grounded on `oj-daemon::listener`'s accept-loop-plus-per-connection-task
//! shape; the per-request body is new (there is nothing to route to in the
//! teacher beyond a single job queue), built directly against
//! `lrs_engine::scheduler`/`lrs_core::request` instead.

use std::sync::Arc;
use std::time::Duration;

use lrs_core::{
    AdminStatus, Device, DeviceId, Errno, Family, FsStatus, Lock, LockType, Medium, MediumId,
    RequestContainer, RequestId, SubRequest, SubRequestId, UuidIdGen,
};
use lrs_core::IdGen;
use lrs_dss::DssGateway;
use lrs_engine::{DispatchUnit, WorkItem};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tracing::{error, warn};

use crate::lifecycle::DaemonState;
use crate::protocol::{NotifyKind, Request, Response};
use crate::protocol_wire::{self, ProtocolError, DEFAULT_TIMEOUT};

/// How often a connection task polls its outstanding requests' containers
/// for a published response. `lrs_core::RequestContainer` carries no tokio
/// wake primitive (the crate has no tokio dependency at all), so delivery
/// is a poll rather than an await on a channel.
const RESPONSE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `spec.md` §4.5 step 1: stop accepting new connections. Binds the
/// configured transport(s) and serves until `shutdown` resolves, at which
/// point the accept loop(s) are aborted by the caller before
/// `DaemonState::shutdown` runs steps 2-5.
pub async fn serve(state: Arc<DaemonState>, shutdown: impl std::future::Future<Output = ()>) {
    let id_gen = UuidIdGen;
    let mut tasks = Vec::new();

    if let Some(path) = state.config.lrs.listen_socket_path.clone() {
        let _ = std::fs::remove_file(&path);
        match UnixListener::bind(&path) {
            Ok(listener) => {
                let state = Arc::clone(&state);
                let id_gen = id_gen.clone();
                tasks.push(tokio::spawn(async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, _addr)) => {
                                let state = Arc::clone(&state);
                                let id_gen = id_gen.clone();
                                tokio::spawn(async move {
                                    let (r, w) = stream.into_split();
                                    handle_connection(state, id_gen, r, w).await;
                                });
                            }
                            Err(e) => warn!(error = %e, "unix accept failed"),
                        }
                    }
                }));
            }
            Err(e) => error!(path = %path, error = %e, "failed to bind unix socket"),
        }
    }

    if let (Some(host), Some(port)) = (
        state.config.lrs.listen_tcp_host.clone(),
        state.config.lrs.listen_tcp_port,
    ) {
        match TcpListener::bind((host.as_str(), port)).await {
            Ok(listener) => {
                let state = Arc::clone(&state);
                let id_gen = id_gen.clone();
                tasks.push(tokio::spawn(async move {
                    loop {
                        match listener.accept().await {
                            Ok((stream, _addr)) => {
                                let state = Arc::clone(&state);
                                let id_gen = id_gen.clone();
                                tokio::spawn(async move {
                                    let (r, w) = stream.into_split();
                                    handle_connection(state, id_gen, r, w).await;
                                });
                            }
                            Err(e) => warn!(error = %e, "tcp accept failed"),
                        }
                    }
                }));
            }
            Err(e) => error!(host, port, error = %e, "failed to bind tcp listener"),
        }
    }

    shutdown.await;
    for task in tasks {
        task.abort();
    }
}

async fn handle_connection<R, W>(state: Arc<DaemonState>, id_gen: UuidIdGen, mut reader: R, mut writer: W)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let request = match protocol_wire::read_request(&mut reader, DEFAULT_TIMEOUT).await {
            Ok(req) => req,
            Err(ProtocolError::VersionMismatch { .. }) => {
                let response = Response::error(Errno::EPROTONOSUPPORT);
                if protocol_wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
                    .await
                    .is_err()
                {
                    return;
                }
                continue;
            }
            Err(ProtocolError::ConnectionClosed) => return,
            Err(e) => {
                warn!(error = %e, "error reading request, closing connection");
                return;
            }
        };

        let response = handle_request(&state, &id_gen, request).await;
        if protocol_wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
            .await
            .is_err()
        {
            return;
        }
    }
}

async fn handle_request(state: &DaemonState, id_gen: &UuidIdGen, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Notify(kind) => handle_notify(state, kind).await,
        Request::ReadAlloc { family, medium_id, technology, tag: _ } => {
            handle_alloc(state, id_gen, family, medium_id, technology, false).await
        }
        Request::WriteAlloc { family, medium_id, technology, tag: _ } => {
            handle_alloc(state, id_gen, family, medium_id, technology, true).await
        }
        Request::Release { family, device_id, medium_id, written_bytes, client_errno } => {
            handle_release(state, family, device_id, medium_id, written_bytes, client_errno).await
        }
        Request::Format { family, medium_id, fs_type, unlock } => {
            handle_format(state, id_gen, family, medium_id, fs_type, unlock).await
        }
    }
}

async fn handle_notify(state: &DaemonState, kind: NotifyKind) -> Response {
    match kind {
        NotifyKind::DeviceAdded { family, device_id, model, path } => {
            let Some(scheduler) = state.scheduler(family) else {
                return Response::error(Errno::ENXIO);
            };
            let Some(ctx) = state.context_for(family) else {
                return Response::error(Errno::ENXIO);
            };
            let mut device = Device::new(DeviceId::new(device_id), family, model, path.clone(), state.hostname.clone());
            device.technology = state.config.resolve_technology(&device.model);
            state.register_dummy_drive(family, &path, existing_device_count(state, family).await as u16);
            if let Err(e) = state.dss.put_device(&device).await {
                warn!(error = %e, "failed to persist newly notified device");
                return Response::error(Errno::EIO);
            }
            if let Err(e) = state
                .dss
                .acquire_lock(Lock::new(LockType::Device, device.id.as_str(), state.hostname.clone(), state.pid, epoch_ms()))
                .await
            {
                warn!(device_id = %device.id, error = %e, "device lock already held, refusing notify");
                return Response::error(Errno::EBUSY);
            }
            let (worker, _handle) = lrs_engine::DeviceWorker::spawn(device, ctx);
            scheduler.add_worker(worker);
            Response::Notify
        }
        NotifyKind::DeviceRemoved { family, device_id } => {
            let Some(scheduler) = state.scheduler(family) else {
                return Response::error(Errno::ENXIO);
            };
            scheduler.remove_worker(&DeviceId::new(device_id));
            Response::Notify
        }
        NotifyKind::MediumAdded { family, medium_id, model, fs_type, address_type } => {
            if state.scheduler(family).is_none() {
                return Response::error(Errno::ENXIO);
            }
            let medium = Medium::new(MediumId::new(medium_id), family, model, fs_type, address_type);
            let slot = existing_media_count(state, family).await as u16;
            if let Err(e) = state.dss.put_medium(&medium).await {
                warn!(error = %e, "failed to persist newly registered medium");
                return Response::error(Errno::EIO);
            }
            state.register_dummy_medium(family, medium.id.as_str(), slot);
            Response::Notify
        }
    }
}

/// `spec.md` T6: the media lock is acquired here, before the sub-request
/// ever reaches the scheduler queue. A fair-share admission denial leaves
/// the `DispatchUnit` parked in the incoming queue with the lock still
/// held and `Lock::hostname` unchanged — this function has already
/// returned by then, so there is nothing left here to lose the lock.
async fn handle_alloc(
    state: &DaemonState,
    id_gen: &UuidIdGen,
    family: Family,
    medium_id: Option<String>,
    technology: Option<String>,
    write: bool,
) -> Response {
    let Some(scheduler) = state.scheduler(family) else {
        return Response::error(Errno::ENXIO);
    };

    let medium = match select_medium(state, family, medium_id, technology.clone(), write).await {
        Ok(m) => m,
        Err(errno) => return Response::error(errno),
    };

    if let Err(e) = state
        .dss
        .acquire_lock(Lock::new(
            LockType::Media,
            medium.id.as_str(),
            state.hostname.clone(),
            state.pid,
            epoch_ms(),
        ))
        .await
    {
        warn!(medium_id = %medium.id, error = %e, "medium already locked");
        return Response::error(Errno::EBUSY);
    }

    let kind = if write { lrs_core::RequestKind::WriteAlloc } else { lrs_core::RequestKind::ReadAlloc };
    let request_id = RequestId::new(id_gen.next());
    let container = RequestContainer::new(request_id, kind, 0, 1);
    let sub_request = SubRequest::new(SubRequestId::new(id_gen.next()), container.clone(), 0);
    let unit = DispatchUnit {
        sub_request,
        work: WorkItem::ReadWrite { medium_id: medium.id.clone(), write },
        technology: technology.or_else(|| state.config.resolve_technology(&medium.model)),
        enqueued_at: std::time::Instant::now(),
    };

    if scheduler.submit(unit).is_err() {
        let _ = state
            .dss
            .release_lock(LockType::Media, medium.id.as_str(), &state.hostname, state.pid)
            .await;
        return Response::error(Errno::EIO);
    }

    await_response(container).await
}

async fn handle_release(
    state: &DaemonState,
    family: Family,
    device_id: String,
    medium_id: String,
    written_bytes: u64,
    client_errno: Option<i32>,
) -> Response {
    let Some(scheduler) = state.scheduler(family) else {
        return Response::error(Errno::ENXIO);
    };

    let request_id = RequestId::new(UuidIdGen.next());
    let container = RequestContainer::new(request_id, lrs_core::RequestKind::Release, 0, 1);

    scheduler.submit_release(
        &DeviceId::new(device_id),
        lrs_engine::PendingRelease {
            request: container.clone(),
            sub_request_idx: 0,
            written_bytes,
            client_errno: client_errno.map(Errno),
            queued_at: std::time::Instant::now(),
        },
    );
    let _ = medium_id;

    await_response(container).await
}

/// `spec.md` T7: fails fast with `-ENODEV` rather than hanging in dispatch
/// when no device in this family can physically service the medium's
/// technology. An ordinary busy-device wait (every admissible drive
/// occupied) is not this case — `select_worker` handles that by leaving the
/// unit queued, same as `handle_alloc`.
async fn handle_format(
    state: &DaemonState,
    id_gen: &UuidIdGen,
    family: Family,
    medium_id: String,
    fs_type: lrs_core::FsType,
    unlock: bool,
) -> Response {
    let Some(scheduler) = state.scheduler(family) else {
        return Response::error(Errno::ENXIO);
    };

    let medium = match state.dss.get_medium(&MediumId::new(medium_id.clone())).await {
        Ok(Some(m)) => m,
        Ok(None) => return Response::error(Errno::ENODEV),
        Err(e) => {
            warn!(error = %e, "dss error resolving medium for format");
            return Response::error(Errno::EIO);
        }
    };

    let technology = state.config.resolve_technology(&medium.model);
    let capable = scheduler
        .workers()
        .iter()
        .any(|w| w.snapshot().technology == technology);
    if !capable {
        return Response::error(Errno::ENODEV);
    }

    if let Err(e) = state
        .dss
        .acquire_lock(Lock::new(
            LockType::Media,
            medium.id.as_str(),
            state.hostname.clone(),
            state.pid,
            epoch_ms(),
        ))
        .await
    {
        warn!(medium_id = %medium.id, error = %e, "medium already locked");
        return Response::error(Errno::EBUSY);
    }

    let request_id = RequestId::new(id_gen.next());
    let container = RequestContainer::new(request_id, lrs_core::RequestKind::Format, 0, 1);
    let sub_request = SubRequest::new(SubRequestId::new(id_gen.next()), container.clone(), 0);
    let unit = DispatchUnit {
        sub_request,
        work: WorkItem::Format { medium_id: medium.id.clone(), fs_type, unlock },
        technology,
        enqueued_at: std::time::Instant::now(),
    };

    if scheduler.submit(unit).is_err() {
        let _ = state
            .dss
            .release_lock(LockType::Media, medium.id.as_str(), &state.hostname, state.pid)
            .await;
        return Response::error(Errno::EIO);
    }

    await_response(container).await
}

async fn select_medium(
    state: &DaemonState,
    family: Family,
    medium_id: Option<String>,
    technology: Option<String>,
    write: bool,
) -> Result<Medium, Errno> {
    if let Some(id) = medium_id {
        return match state.dss.get_medium(&MediumId::new(id)).await {
            Ok(Some(m)) if m.family == family => Ok(m),
            Ok(Some(_)) => Err(Errno::EINVAL),
            Ok(None) => Err(Errno::ENODEV),
            Err(_) => Err(Errno::EIO),
        };
    }

    let media = state.dss.list_media().await.map_err(|_| Errno::EIO)?;
    media
        .into_iter()
        .filter(|m| m.family == family)
        .filter(|m| m.admin_status == AdminStatus::Unlocked)
        .filter(|m| !write || m.is_usable_for_write())
        .filter(|m| !write || m.fs_status != FsStatus::Full)
        .filter(|m| {
            technology.as_deref().map_or(true, |t| {
                state.config.resolve_technology(&m.model).as_deref() == Some(t)
            })
        })
        .next()
        .ok_or(Errno::ENODEV)
}

async fn await_response(container: RequestContainer) -> Response {
    loop {
        if let Some(response) = container.take_response() {
            return response;
        }
        tokio::time::sleep(RESPONSE_POLL_INTERVAL).await;
    }
}

/// Slot numbers only need to be distinct within `DummyLibraryAdapter`'s
/// table, not stable across restarts; counting existing rows is enough.
async fn existing_device_count(state: &DaemonState, family: Family) -> usize {
    state
        .dss
        .list_devices()
        .await
        .map(|devices| devices.iter().filter(|d| d.family == family).count())
        .unwrap_or(0)
}

async fn existing_media_count(state: &DaemonState, family: Family) -> usize {
    state
        .dss
        .list_media()
        .await
        .map(|media| media.iter().filter(|m| m.family == family).count())
        .unwrap_or(0)
}

fn epoch_ms() -> u64 {
    use lrs_core::{Clock, SystemClock};
    SystemClock.epoch_ms()
}
