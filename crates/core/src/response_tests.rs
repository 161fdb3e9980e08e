// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_response_carries_negated_errno() {
    let r = Response::error(Errno::ENOSPC);
    match r {
        Response::Error { errno } => assert_eq!(errno, -libc::ENOSPC),
        _ => panic!("expected Error variant"),
    }
}

#[test]
fn response_kind_is_tagged_for_wire_serialization() {
    let json = serde_json::to_string(&Response::Pong).expect("serialize");
    assert!(json.contains("\"kind\":\"pong\""));
}
