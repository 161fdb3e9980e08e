// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn container(n: usize) -> RequestContainer {
    RequestContainer::new(RequestId::new("req-1"), RequestKind::ReadAlloc, 0, n)
}

#[test]
fn first_error_wins() {
    let c = container(2);
    assert!(c.record_error(Errno::ENODEV));
    assert!(!c.record_error(Errno::EBUSY));
    assert_eq!(c.error(), Some(Errno::ENODEV));
}

#[test]
fn all_terminal_requires_every_sub_status_resolved() {
    let c = container(2);
    assert!(!c.all_terminal());
    c.set_sub_status(0, SubStatus::Done);
    assert!(!c.all_terminal());
    c.set_sub_status(1, SubStatus::Error);
    assert!(c.all_terminal());
}

#[test]
fn cancel_remaining_skips_the_failing_index_and_terminal_siblings() {
    let c = container(3);
    c.set_sub_status(1, SubStatus::Done);
    c.cancel_remaining(0);
    assert_eq!(c.sub_status(0), Some(SubStatus::Pending));
    assert_eq!(c.sub_status(1), Some(SubStatus::Done));
    assert_eq!(c.sub_status(2), Some(SubStatus::Cancel));
}

#[test]
fn publish_is_one_shot() {
    let c = container(1);
    assert!(c.publish(Response::Pong));
    assert!(!c.publish(Response::Release));
    assert!(matches!(c.take_response(), Some(Response::Pong)));
    assert!(c.take_response().is_none());
}
