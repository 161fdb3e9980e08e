// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn negates_for_wire_encoding() {
    assert_eq!(Errno::EBUSY.as_negative(), -libc::EBUSY);
    assert_eq!(Errno::ENOSPC.as_negative(), -libc::ENOSPC);
}

#[test]
fn transient_set_matches_spec_taxonomy() {
    for e in [
        Errno::EBUSY,
        Errno::EAGAIN,
        Errno::ETIMEDOUT,
        Errno::EINTR,
        Errno::EIO,
    ] {
        assert!(e.is_transient(), "{e} should be transient");
    }
    for e in [Errno::ENOSPC, Errno::ENODEV, Errno::EINVAL, Errno::ECANCELED] {
        assert!(!e.is_transient(), "{e} should not be transient");
    }
}

#[test]
fn display_matches_wire_scale() {
    assert_eq!(Errno::EEXIST.to_string(), format!("-{}", libc::EEXIST));
}
