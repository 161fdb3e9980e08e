// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire framing (`spec.md` §4.6, §6): one byte protocol version, then a
//! 4-byte big-endian length prefix, then an opaque payload — grounded on
//! `oj-daemon::protocol_wire`'s `{read_message, write_message, encode,
//! decode}`, which is the same length-prefixed framing minus the leading
//! version byte; that byte is read/validated here as its own step before
//! handing the rest to the same length-prefix routine.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::protocol::{Request, Response};

/// Protocol errors (`spec.md` §7 "Protocol errors").
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,

    /// `spec.md` §4.6: "A mismatched version returns `-EPROTONOSUPPORT`."
    /// The connection is left open; the caller writes an error response
    /// framed with [`WIRE_VERSION`] and keeps reading.
    #[error("unsupported wire version {found} (expected {WIRE_VERSION})")]
    VersionMismatch { found: u8 },
}

impl ProtocolError {
    pub fn errno(&self) -> lrs_core::Errno {
        match self {
            ProtocolError::VersionMismatch { .. } => lrs_core::Errno::EPROTONOSUPPORT,
            ProtocolError::MessageTooLarge { .. } | ProtocolError::Json(_) => lrs_core::Errno::EINVAL,
            ProtocolError::Io(_) | ProtocolError::ConnectionClosed | ProtocolError::Timeout => {
                lrs_core::Errno::EIO
            }
        }
    }
}

/// The one protocol version this daemon speaks (`spec.md` §4.6: "one byte
/// protocol version").
pub const WIRE_VERSION: u8 = 0x01;

pub const MAX_MESSAGE_SIZE: usize = 200 * 1024 * 1024;

pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Encodes a payload to JSON bytes, without the version byte or length
/// prefix. Use with [`write_message`], which adds both.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads the leading version byte. Returns [`ProtocolError::VersionMismatch`]
/// on anything but [`WIRE_VERSION`] — the caller decides whether to answer
/// with an error frame and keep the connection, per `spec.md` §4.6.
pub async fn read_version<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<(), ProtocolError> {
    let mut version_buf = [0u8; 1];
    match reader.read_exact(&mut version_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    if version_buf[0] != WIRE_VERSION {
        return Err(ProtocolError::VersionMismatch {
            found: version_buf[0],
        });
    }
    Ok(())
}

/// Reads a length-prefixed payload, the version byte already consumed by
/// [`read_version`].
pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Writes the version byte followed by a length-prefixed payload.
pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    writer.write_all(&[WIRE_VERSION]).await?;
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one request frame: version byte, then length-prefixed JSON payload.
/// A version mismatch is surfaced to the caller without consuming the rest
/// of the stream — the connection is still readable for the next frame.
pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    tokio::time::timeout(timeout, read_version(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_wire_tests.rs"]
mod tests;
