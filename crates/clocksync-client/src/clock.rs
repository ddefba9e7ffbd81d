// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Local clocks and the interpolating clock façade.
//!
//! The connector never reads the wall clock directly. It asks a [`LocalClock`],
//! which in production is a [`MonotonicClock`]: the wall clock is read once and
//! then advanced by `std::time::Instant`, so adjustments of the system clock
//! cannot make interpolated readings jump. Tests drive a [`ManualClock`] instead.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{self, Duration};

use crate::connector::Connector;
use crate::error::Result;
use crate::unix_time::Instant;

/// The local notion of "now" the connector corrects.
pub trait LocalClock: Send + Sync {
    /// The current local instant.
    fn now(&self) -> Instant;
}

/// A provider of corrected instants.
///
/// Views that add a timezone or a fixed offset compose over this trait rather
/// than over a concrete connector.
pub trait TimeSource {
    /// The current corrected instant.
    fn current_time(&self) -> Result<Instant>;
}

/// Wall clock captured once, advanced by the monotonic clock.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    wall_base: Instant,
    mono_base: time::Instant,
}

impl MonotonicClock {
    /// Capture the wall clock now.
    pub fn new() -> Self {
        MonotonicClock {
            wall_base: Instant::now(),
            mono_base: time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalClock for MonotonicClock {
    fn now(&self) -> Instant {
        self.wall_base.saturating_add(self.mono_base.elapsed())
    }
}

impl TimeSource for MonotonicClock {
    /// The uncorrected local reading.
    fn current_time(&self) -> Result<Instant> {
        Ok(self.now())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub fn new(start: Instant) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: Instant) {
        *self.now.lock() = instant;
    }

    /// Move forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(duration);
    }
}

impl LocalClock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// The connector seen as a plain source of corrected instants.
#[derive(Clone, Debug)]
pub struct SyncedClock {
    connector: Arc<Connector>,
}

impl SyncedClock {
    /// Wrap a shared connector.
    pub fn new(connector: Arc<Connector>) -> Self {
        SyncedClock { connector }
    }

    /// The wrapped connector, e.g. to force a resync.
    pub fn connector(&self) -> &Arc<Connector> {
        &self.connector
    }
}

impl TimeSource for SyncedClock {
    fn current_time(&self) -> Result<Instant> {
        self.connector.current_time()
    }
}
