// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// How an [`Interrupt::sleep`] ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sleep {
    /// The full duration passed.
    Elapsed,
    /// Another thread called [`Interrupt::interrupt`].
    Interrupted,
}

/// A cancellation flag for the pause between samples.
///
/// `interrupt()` wakes a sleeping cycle, which then stops early and commits the
/// samples gathered so far. A signal raised while nothing sleeps stays pending
/// and ends the next sleep immediately; each signal is consumed by one sleep.
#[derive(Debug, Default)]
pub struct Interrupt {
    pending: Mutex<bool>,
    wakeup: Condvar,
}

impl Interrupt {
    /// Create a flag with no pending signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake any sleeper.
    pub fn interrupt(&self) {
        let mut pending = self.pending.lock();
        *pending = true;
        self.wakeup.notify_all();
    }

    /// Whether a signal is pending.
    pub fn is_interrupted(&self) -> bool {
        *self.pending.lock()
    }

    /// Drop a pending signal without sleeping.
    pub fn clear(&self) {
        *self.pending.lock() = false;
    }

    /// Block for `duration` unless interrupted, consuming the signal if so.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        let mut pending = self.pending.lock();
        match Instant::now().checked_add(duration) {
            Some(deadline) => {
                while !*pending {
                    if self.wakeup.wait_until(&mut pending, deadline).timed_out() {
                        break;
                    }
                }
            }
            None => {
                while !*pending {
                    self.wakeup.wait(&mut pending);
                }
            }
        }
        if *pending {
            *pending = false;
            Sleep::Interrupted
        } else {
            Sleep::Elapsed
        }
    }
}
