// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::Request;
use std::io::Cursor;

#[tokio::test]
async fn round_trips_a_request_frame() {
    let mut buf = Vec::new();
    let payload = encode(&Request::Ping).expect("encode");
    write_message(&mut buf, &payload).await.expect("write");

    let mut reader = Cursor::new(buf);
    read_version(&mut reader).await.expect("version");
    let bytes = read_message(&mut reader).await.expect("message");
    let decoded: Request = decode(&bytes).expect("decode");
    assert!(matches!(decoded, Request::Ping));
}

#[tokio::test]
async fn rejects_unknown_version_byte() {
    let mut buf = vec![0x02u8];
    buf.extend_from_slice(&0u32.to_be_bytes());
    let mut reader = Cursor::new(buf);
    let err = read_version(&mut reader).await.unwrap_err();
    match err {
        ProtocolError::VersionMismatch { found } => assert_eq!(found, 0x02),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err_to_errno(&err), lrs_core::Errno::EPROTONOSUPPORT);
}

#[tokio::test]
async fn message_over_limit_is_rejected() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes());
    let mut reader = Cursor::new(buf);
    let err = read_message(&mut reader).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

fn err_to_errno(e: &ProtocolError) -> lrs_core::Errno {
    e.errno()
}
