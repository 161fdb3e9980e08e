// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LibType::Scsi` — the real changer is reached through the Tape Library
//! Controller (TLC), a remote service multiplexing SCSI access
//! (`spec.md` §1: "treated as a remote service reached over a bytestream and
//! is not specified here beyond its request/response shape"). Framing is the
//! same length-prefixed JSON envelope the client wire protocol uses
//! (`lrs_daemon::protocol_wire`), reimplemented locally here since adapters
//! sits below the daemon crate in the dependency graph.

use crate::library::{ElementAddress, InventoryEntry, LibraryAdapter, LibraryError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

const MAX_FRAME: u32 = 16 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum TlcRequest {
    Open,
    Close,
    DriveLookup { drive_path: String },
    MediaLookup { medium_id: String },
    MediaMove { from: WireAddress, to: WireAddress },
    Scan,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TlcResponse {
    Ok,
    Address { address: WireAddress },
    Inventory { entries: Vec<WireInventoryEntry> },
    Err { message: String, errno: i32 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireAddress {
    Drive { n: u16 },
    Slot { n: u16 },
}

impl From<ElementAddress> for WireAddress {
    fn from(a: ElementAddress) -> Self {
        match a {
            ElementAddress::Drive(n) => WireAddress::Drive { n },
            ElementAddress::Slot(n) => WireAddress::Slot { n },
        }
    }
}

impl From<WireAddress> for ElementAddress {
    fn from(a: WireAddress) -> Self {
        match a {
            WireAddress::Drive { n } => ElementAddress::Drive(n),
            WireAddress::Slot { n } => ElementAddress::Slot(n),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireInventoryEntry {
    address: WireAddress,
    medium_id: Option<String>,
}

/// Connects to a TLC endpoint over TCP. The connection is established lazily
/// on `open()` and held for the adapter's lifetime; `close()` drops it.
pub struct TlcLibraryAdapter {
    hostname: String,
    port: u16,
    timeout: Duration,
    conn: Mutex<Option<TcpStream>>,
}

impl TlcLibraryAdapter {
    pub fn new(hostname: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            timeout,
            conn: Mutex::new(None),
        }
    }

    async fn call(&self, req: TlcRequest) -> Result<TlcResponse, LibraryError> {
        let mut guard = self.conn.lock().await;
        let stream = guard.as_mut().ok_or(LibraryError::OpenFailed(
            "TLC connection not open".to_string(),
        ))?;
        let payload = serde_json::to_vec(&req)
            .map_err(|e| LibraryError::Io(format!("encode request: {e}")))?;
        tokio::time::timeout(self.timeout, async {
            stream.write_u32(payload.len() as u32).await?;
            stream.write_all(&payload).await?;
            stream.flush().await?;
            let len = stream.read_u32().await?;
            if len > MAX_FRAME {
                return Err(std::io::Error::other("TLC response too large"));
            }
            let mut buf = vec![0u8; len as usize];
            stream.read_exact(&mut buf).await?;
            Ok(buf)
        })
        .await
        .map_err(|_| LibraryError::TimedOut)?
        .map_err(|e: std::io::Error| LibraryError::Io(e.to_string()))
        .and_then(|buf| {
            serde_json::from_slice(&buf).map_err(|e| LibraryError::Io(format!("decode: {e}")))
        })
    }
}

#[async_trait]
impl LibraryAdapter for TlcLibraryAdapter {
    async fn open(&self) -> Result<(), LibraryError> {
        let stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.hostname.as_str(), self.port)),
        )
        .await
        .map_err(|_| LibraryError::TimedOut)?
        .map_err(|e| LibraryError::OpenFailed(e.to_string()))?;
        *self.conn.lock().await = Some(stream);
        match self.call(TlcRequest::Open).await? {
            TlcResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn close(&self) -> Result<(), LibraryError> {
        let result = self.call(TlcRequest::Close).await;
        *self.conn.lock().await = None;
        match result? {
            TlcResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn drive_lookup(&self, drive_path: &str) -> Result<ElementAddress, LibraryError> {
        match self
            .call(TlcRequest::DriveLookup {
                drive_path: drive_path.to_string(),
            })
            .await?
        {
            TlcResponse::Address { address } => Ok(address.into()),
            other => Err(unexpected(other)),
        }
    }

    async fn media_lookup(&self, medium_id: &str) -> Result<ElementAddress, LibraryError> {
        match self
            .call(TlcRequest::MediaLookup {
                medium_id: medium_id.to_string(),
            })
            .await?
        {
            TlcResponse::Address { address } => Ok(address.into()),
            other => Err(unexpected(other)),
        }
    }

    async fn media_move(
        &self,
        from: ElementAddress,
        to: ElementAddress,
    ) -> Result<(), LibraryError> {
        let drive_to_drive = from.is_drive() && to.is_drive();
        match self
            .call(TlcRequest::MediaMove {
                from: from.into(),
                to: to.into(),
            })
            .await?
        {
            TlcResponse::Ok => Ok(()),
            TlcResponse::Err { errno, .. } if errno == libc::EINVAL && drive_to_drive => {
                Err(LibraryError::InvalidMove)
            }
            other => Err(unexpected(other)),
        }
    }

    async fn scan(&self) -> Result<Vec<InventoryEntry>, LibraryError> {
        match self.call(TlcRequest::Scan).await? {
            TlcResponse::Inventory { entries } => Ok(entries
                .into_iter()
                .map(|e| InventoryEntry {
                    address: e.address.into(),
                    medium_id: e.medium_id,
                })
                .collect()),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(resp: TlcResponse) -> LibraryError {
    match resp {
        TlcResponse::Err { message, errno } if errno == libc::EBUSY => {
            let _ = message;
            LibraryError::Busy
        }
        TlcResponse::Err { message, .. } => LibraryError::Io(message),
        _ => LibraryError::Io("unexpected TLC response shape".to_string()),
    }
}

#[cfg(test)]
#[path = "tlc_tests.rs"]
mod tests;
