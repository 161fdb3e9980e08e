// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lrs-daemon: the request router, wire framing, lock-recovery/shutdown
//! sequencer, and config loading for `lrsd` (`spec.md` §2 components 10-11).
//! Exposes the protocol types so `lrs-admin` and other client drivers can
//! speak the wire format without depending on the listener itself.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod protocol_wire;

pub use lifecycle::{Config, DaemonState, LifecycleError};
pub use protocol::{NotifyKind, Request, Response};
pub use protocol_wire::{ProtocolError, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, WIRE_VERSION};
