// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The connect / average / smooth life-cycle shared by every transport.
//!
//! [`Connector::connect`] runs one estimation cycle and, on success, swaps in a
//! new [`SyncState`]. [`Connector::current_time`] reads the committed state and
//! interpolates from the local clock; it only touches the network before the
//! first successful sync.
//!
//! # Smoothing
//!
//! A correction that moves the reported time forward applies at once. One that
//! moves it backward (the local clock runs fast) is phased in linearly over the
//! clock-shift window, starting from the offset that was in effect when the new
//! state was committed. The window is stretched to at least twice the size of
//! the backward step so the reported time keeps advancing at half speed or
//! better and never goes back.

use arc_swap::ArcSwapOption;
use log::{debug, info};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::clock::{LocalClock, MonotonicClock, TimeSource};
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::estimator::Estimate;
use crate::interrupt::Interrupt;
use crate::protocol::{LeapIndicator, Packet};
use crate::transport::{SntpTransport, Transport};
use crate::unix_time::Instant;

/// The committed result of a successful cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncState {
    /// Offset measured by the cycle, in microseconds.
    pub average_offset_micros: i64,
    /// Offset in effect at the moment this state was committed (0 for the first).
    pub previous_offset_micros: i64,
    /// Local clock reading at commit.
    pub sampled_at: Instant,
    /// Leap indicator of the last reply.
    pub leap: LeapIndicator,
    /// Number of samples averaged.
    pub samples: u32,
    /// The last validated reply.
    pub last_reply: Option<Packet>,
    /// Smallest round-trip delay of the cycle, in microseconds.
    pub min_delay_micros: Option<i64>,
}

impl SyncState {
    /// The offset to add to the local clock at `now`.
    pub fn applied_offset_micros(&self, now: Instant, window: Duration) -> i64 {
        let target = self.average_offset_micros;
        let start = self.previous_offset_micros;
        if target >= start || window.is_zero() {
            return target;
        }

        let step = target as i128 - start as i128;
        let window_micros = (window.as_micros() as i128).max(2 * step.abs());
        let elapsed = now.micros_since(self.sampled_at).max(0) as i128;
        if elapsed >= window_micros {
            return target;
        }
        step.checked_mul(elapsed)
            .map_or(target, |shift| (start as i128 + shift / window_micros) as i64)
    }

    /// The local instant `now` corrected by the applied offset, at microsecond resolution.
    pub fn corrected(&self, now: Instant, window: Duration) -> Instant {
        let applied = self.applied_offset_micros(now, window);
        Instant::from_micros(now.as_micros().saturating_add(applied))
    }

    /// Whether the server announced a leap second for the end of the month.
    pub fn leap_pending(&self) -> bool {
        self.leap.is_leap_pending()
    }
}

/// Owns a configuration, a transport and the committed synchronization state.
pub struct Connector {
    config: ConnectorConfig,
    transport: Box<dyn Transport>,
    clock: Arc<dyn LocalClock>,
    interrupt: Arc<Interrupt>,
    state: ArcSwapOption<SyncState>,
    connecting: Mutex<()>,
}

impl Connector {
    /// An SNTP connector reading a [`MonotonicClock`].
    pub fn new(config: ConnectorConfig) -> Self {
        Self::with_parts(
            config,
            Box::new(SntpTransport),
            Arc::new(MonotonicClock::new()),
        )
    }

    /// A connector with an explicit transport and local clock.
    pub fn with_parts(
        config: ConnectorConfig,
        transport: Box<dyn Transport>,
        clock: Arc<dyn LocalClock>,
    ) -> Self {
        Connector {
            config,
            transport,
            clock,
            interrupt: Arc::new(Interrupt::new()),
            state: ArcSwapOption::empty(),
            connecting: Mutex::new(()),
        }
    }

    /// The configuration this connector was built with.
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Run one cycle, commit its result and return the corrected current instant.
    ///
    /// Concurrent calls run one after the other. On error the previously
    /// committed state is kept as it was.
    pub fn connect(&self) -> Result<Instant> {
        let _guard = self.connecting.lock();
        self.connect_locked()
    }

    fn connect_locked(&self) -> Result<Instant> {
        // A signal raised while no cycle was pausing belongs to no cycle.
        self.interrupt.clear();
        let estimate = if self.config.request_count() == 0 {
            Estimate::passthrough()
        } else {
            self.transport
                .exchange(&self.config, &*self.clock, &self.interrupt)?
        };

        let window = self.config.clock_shift_window();
        let sampled_at = self.clock.now();
        let previous_offset_micros = self
            .sync_state()
            .map_or(0, |prev| prev.applied_offset_micros(sampled_at, window));
        let state = Arc::new(SyncState {
            average_offset_micros: estimate.average_offset_micros,
            previous_offset_micros,
            sampled_at,
            leap: estimate.leap,
            samples: estimate.samples,
            last_reply: estimate.last_reply,
            min_delay_micros: estimate.min_delay_micros,
        });
        self.state.store(Some(Arc::clone(&state)));

        info!(
            "synchronized with {}: offset={}us samples={} ({:?})",
            self.config.address(),
            state.average_offset_micros,
            state.samples,
            estimate.stop
        );
        if state.leap_pending() {
            debug!("leap second pending ({:?})", state.leap);
        }
        Ok(state.corrected(sampled_at, window))
    }

    /// The corrected current instant.
    ///
    /// Interpolates from the committed state without network I/O. Before the
    /// first successful sync it connects on the calling thread.
    pub fn current_time(&self) -> Result<Instant> {
        if let Some(state) = self.sync_state() {
            return Ok(self.interpolate(&state));
        }
        let _guard = self.connecting.lock();
        // Another caller may have synced while we waited.
        if let Some(state) = self.sync_state() {
            return Ok(self.interpolate(&state));
        }
        self.connect_locked()
    }

    fn interpolate(&self, state: &SyncState) -> Instant {
        state.corrected(self.clock.now(), self.config.clock_shift_window())
    }

    /// Whether a cycle has been committed.
    pub fn is_synced(&self) -> bool {
        self.state.load().is_some()
    }

    /// The committed state, if any.
    pub fn sync_state(&self) -> Option<Arc<SyncState>> {
        self.state.load_full()
    }

    /// The last validated reply of the committed cycle, for diagnostics.
    pub fn last_reply(&self) -> Option<Packet> {
        self.sync_state().and_then(|state| state.last_reply)
    }

    /// The flag that cuts short the pause between samples of a running cycle.
    ///
    /// Every cycle starts by dropping a pending signal, so interrupting while no
    /// cycle runs has no effect on the next one.
    pub fn interrupt_handle(&self) -> Arc<Interrupt> {
        Arc::clone(&self.interrupt)
    }

    /// Run [`connect`](Self::connect) on a new thread.
    pub fn spawn_connect(self: &Arc<Self>) -> io::Result<thread::JoinHandle<Result<Instant>>> {
        let connector = Arc::clone(self);
        thread::Builder::new()
            .name("clocksync-connect".into())
            .spawn(move || connector.connect())
    }
}

impl TimeSource for Connector {
    fn current_time(&self) -> Result<Instant> {
        Connector::current_time(self)
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("state", &self.sync_state())
            .finish_non_exhaustive()
    }
}
