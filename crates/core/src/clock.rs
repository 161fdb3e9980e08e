// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic-and-realtime time source (`spec.md` §2 "Clock and timers").

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Abstracts over wall-clock and monotonic time so device workers and the sync
/// batcher can be driven deterministically in tests.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for wakeup-deadline arithmetic.
    fn now(&self) -> Instant;
    /// Wall-clock milliseconds since the Unix epoch, used for DSS timestamps.
    fn epoch_ms(&self) -> u64;
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}

struct FakeClockState {
    now: Instant,
    epoch_ms: u64,
}

/// A manually-advanced clock for tests: wakeup-floor arithmetic, sync-batcher
/// thresholds, and lock-recovery timestamps can all be exercised without
/// sleeping real time.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockState {
                now: Instant::now(),
                epoch_ms: 0,
            })),
        }
    }

    pub fn advance(&self, d: Duration) {
        let mut state = self.inner.lock();
        state.now += d;
        state.epoch_ms += d.as_millis() as u64;
    }

    pub fn set_epoch_ms(&self, epoch_ms: u64) {
        self.inner.lock().epoch_ms = epoch_ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().now
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
