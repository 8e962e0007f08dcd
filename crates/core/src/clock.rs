// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time sources. Backends measure command timeouts against [`Clock::now`];
//! records are stamped with [`Clock::epoch_ms`].

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic reading
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the Unix epoch
    fn epoch_ms(&self) -> u64;

    fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }

    /// Whether a `timeout_secs` budget started at `started` has run out.
    /// A zero budget never runs out.
    fn expired(&self, started: Instant, timeout_secs: u64) -> bool {
        timeout_secs > 0 && self.elapsed_since(started) >= Duration::from_secs(timeout_secs)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as u64)
    }
}

#[derive(Debug)]
struct FakeTime {
    instant: Instant,
    epoch_ms: u64,
}

/// Test clock that only moves when told to. Clones share one reading.
#[derive(Clone, Debug)]
pub struct FakeClock {
    time: Arc<Mutex<FakeTime>>,
}

/// Epoch reading a fresh [`FakeClock`] starts at
pub const FAKE_EPOCH_MS: u64 = 1_000_000;

impl FakeClock {
    pub fn new() -> Self {
        let time = FakeTime { instant: Instant::now(), epoch_ms: FAKE_EPOCH_MS };
        Self { time: Arc::new(Mutex::new(time)) }
    }

    /// Advance the monotonic and wall-clock readings together
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock();
        time.instant += by;
        time.epoch_ms += by.as_millis() as u64;
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        self.time.lock().epoch_ms = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.time.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        self.time.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
