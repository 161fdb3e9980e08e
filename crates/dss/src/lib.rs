// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Data-access gateway onto the DSS (`spec.md` §1, §3): devices, media, and
//! locks, behind the `DssGateway` trait. `FileDss` is the working default
//! implementation (atomic JSON file); `FakeDss` is the in-memory test
//! double. No query language, no transactions — every table is addressed by
//! its single key.

mod error;
mod fake_dss;
mod file_dss;
mod gateway;

pub use error::DssError;
pub use fake_dss::FakeDss;
pub use file_dss::FileDss;
pub use gateway::DssGateway;
