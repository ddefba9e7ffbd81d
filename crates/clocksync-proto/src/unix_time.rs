// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use crate::error::ParseError;
use crate::protocol;
use std::time;

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

/// The number of seconds in one NTP era (2^32 seconds, approximately 136 years).
pub const ERA_SECONDS: i64 = 1 << 32;

/// Unix seconds of 2036-02-07T06:28:16Z, the first instant encoded with the 2036 base.
pub const ERA1_START_UNIX: i64 = ERA_SECONDS - EPOCH_DELTA;

/// Most significant bit of the seconds field.
const ERA_BIT: u32 = 0x8000_0000;

const NANOS_PER_SEC: i128 = 1_000_000_000;
const NANOS_PER_MICRO: i128 = 1_000;

/// An instant relative to `UNIX_EPOCH` (00:00:00 UTC, 1 January 1970): whole seconds plus a
/// non-negative nanosecond fraction.
///
/// For instants before the epoch `secs` is negative while `subsec_nanos` still counts forward,
/// so `-0.25 s` is `(-1, 750_000_000)`. Ordering is lexicographic on the two components, which
/// matches the time line.
///
/// The type carries no calendar logic. Use the `chrono` crate or similar to turn it into a
/// human readable date.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant {
    secs: i64,
    subsec_nanos: u32,
}

impl Instant {
    /// The Unix epoch itself.
    pub const UNIX_EPOCH: Instant = Instant {
        secs: 0,
        subsec_nanos: 0,
    };

    /// Create a new **Instant** from its components.
    ///
    /// Returns `None` unless `subsec_nanos` is below one second.
    pub fn new(secs: i64, subsec_nanos: u32) -> Option<Instant> {
        if subsec_nanos < NANOS_PER_SEC as u32 {
            Some(Instant { secs, subsec_nanos })
        } else {
            None
        }
    }

    /// Reads the wall clock through `std::time::SystemTime`.
    ///
    /// ## Example
    ///
    /// ```
    /// println!("{:?}", clocksync_proto::unix_time::Instant::now());
    /// ```
    pub fn now() -> Self {
        Instant::from(time::SystemTime::now())
    }

    /// Create an instant from microseconds since the Unix epoch.
    pub fn from_micros(micros: i64) -> Self {
        let micros = micros as i128;
        Self::from_nanos_saturating(micros * NANOS_PER_MICRO)
    }

    /// The "seconds" component of the **Instant**.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// The fractional component of the **Instant** in nanoseconds, always in `[0, 10^9)`.
    pub fn subsec_nanos(&self) -> u32 {
        self.subsec_nanos
    }

    /// Microseconds since the Unix epoch, rounded toward negative infinity.
    pub fn as_micros(&self) -> i64 {
        self.as_nanos().div_euclid(NANOS_PER_MICRO) as i64
    }

    /// Signed number of microseconds from `earlier` to `self`.
    pub fn micros_since(&self, earlier: Instant) -> i64 {
        let diff = (self.as_nanos() - earlier.as_nanos()).div_euclid(NANOS_PER_MICRO);
        diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Shift the instant by a signed number of microseconds.
    ///
    /// Returns `None` if the result does not fit.
    pub fn checked_add_micros(self, micros: i64) -> Option<Self> {
        let nanos = self.as_nanos() + micros as i128 * NANOS_PER_MICRO;
        let secs = nanos.div_euclid(NANOS_PER_SEC);
        if secs > i64::MAX as i128 || secs < i64::MIN as i128 {
            return None;
        }
        Some(Self::from_nanos_saturating(nanos))
    }

    /// Shift the instant by a signed number of microseconds, saturating at the bounds.
    pub fn saturating_add_micros(self, micros: i64) -> Self {
        Self::from_nanos_saturating(self.as_nanos() + micros as i128 * NANOS_PER_MICRO)
    }

    /// Shift the instant by a `Duration`, saturating at the upper bound.
    pub fn saturating_add(self, duration: time::Duration) -> Self {
        Self::from_nanos_saturating(self.as_nanos() + duration.as_nanos() as i128)
    }

    /// Nanoseconds since the Unix epoch.
    pub fn as_nanos(&self) -> i128 {
        self.secs as i128 * NANOS_PER_SEC + self.subsec_nanos as i128
    }

    fn from_nanos_saturating(nanos: i128) -> Self {
        let secs = nanos.div_euclid(NANOS_PER_SEC);
        if secs > i64::MAX as i128 {
            return Instant {
                secs: i64::MAX,
                subsec_nanos: NANOS_PER_SEC as u32 - 1,
            };
        }
        if secs < i64::MIN as i128 {
            return Instant {
                secs: i64::MIN,
                subsec_nanos: 0,
            };
        }
        Instant {
            secs: secs as i64,
            subsec_nanos: nanos.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }
}

impl From<time::SystemTime> for Instant {
    fn from(t: time::SystemTime) -> Self {
        match t.duration_since(time::UNIX_EPOCH) {
            Ok(duration) => Instant::from_nanos_saturating(duration.as_nanos() as i128),
            Err(pre_epoch) => {
                Instant::from_nanos_saturating(-(pre_epoch.duration().as_nanos() as i128))
            }
        }
    }
}

// Fraction conversions. Encoding rounds to the nearest fraction unit, decoding floors to
// whole nanoseconds, so a timestamp survives decode + encode to within one nanosecond.

fn nanos_to_fraction(nanos: u32) -> u32 {
    let scaled = ((nanos as u64) << 32) + 500_000_000;
    (scaled / 1_000_000_000).min(u32::MAX as u64) as u32
}

fn fraction_to_nanos(fraction: u32) -> u32 {
    ((fraction as u64 * 1_000_000_000) >> 32) as u32
}

impl From<protocol::TimestampFormat> for Instant {
    /// Decodes a 64-bit timestamp, choosing the era by the most significant bit of the seconds:
    /// set means seconds since 1900-01-01, clear means seconds since 2036-02-07T06:28:16Z.
    fn from(t: protocol::TimestampFormat) -> Self {
        let base = if t.seconds & ERA_BIT != 0 {
            -EPOCH_DELTA
        } else {
            ERA1_START_UNIX
        };
        Instant {
            secs: base + t.seconds as i64,
            subsec_nanos: fraction_to_nanos(t.fraction),
        }
    }
}

impl TryFrom<Instant> for protocol::TimestampFormat {
    type Error = ParseError;

    /// Encodes an instant as a 64-bit timestamp.
    ///
    /// Instants on or after 2036-02-07T06:28:16Z are written relative to that moment with the
    /// most significant bit clear; earlier instants are written relative to 1900 with the bit
    /// set. Anything the rule cannot express is rejected rather than wrapped.
    fn try_from(t: Instant) -> Result<Self, Self::Error> {
        let out_of_range = ParseError::TimestampOutOfRange { unix_secs: t.secs };
        let ntp_secs = t.secs.checked_add(EPOCH_DELTA).ok_or(out_of_range.clone())?;
        let seconds = if ntp_secs >= ERA_SECONDS {
            let offset = ntp_secs - ERA_SECONDS;
            if offset >= ERA_BIT as i64 {
                return Err(out_of_range);
            }
            offset as u32
        } else {
            if ntp_secs < ERA_BIT as i64 {
                return Err(out_of_range);
            }
            ntp_secs as u32
        };
        Ok(protocol::TimestampFormat {
            seconds,
            fraction: nanos_to_fraction(t.subsec_nanos),
        })
    }
}
