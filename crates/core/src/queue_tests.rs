// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fifo_order() {
    let q: Queue<u32> = Queue::new();
    q.push(1);
    q.push(2);
    q.push(3);
    assert_eq!(q.pop(), Some(1));
    assert_eq!(q.pop(), Some(2));
    assert_eq!(q.len(), 1);
    assert_eq!(q.pop(), Some(3));
    assert_eq!(q.pop(), None);
}

#[test]
fn push_front_takes_priority() {
    let q: Queue<u32> = Queue::new();
    q.push(1);
    q.push(2);
    q.push_front(0);
    assert_eq!(q.pop(), Some(0));
    assert_eq!(q.pop(), Some(1));
    assert_eq!(q.pop(), Some(2));
}

#[test]
fn drain_filter_partitions_and_preserves_order() {
    let q: Queue<u32> = Queue::new();
    for i in 0..5 {
        q.push(i);
    }
    let removed = q.drain_filter(|v| v % 2 == 0);
    assert_eq!(removed, vec![1, 3]);
    assert_eq!(q.drain_all(), vec![0, 2, 4]);
}

#[test]
fn drain_all_empties_queue() {
    let q: Queue<u32> = Queue::new();
    q.push(1);
    q.push(2);
    assert_eq!(q.drain_all(), vec![1, 2]);
    assert!(q.is_empty());
}
