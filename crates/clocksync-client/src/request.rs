// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Request construction, reply validation and the per-sample offset arithmetic.
//!
//! A request is a fresh 48-octet client packet whose only non-zero field besides
//! byte 0 is the transmit timestamp. A reply is checked in a fixed order and
//! rejected on the first failing rule; nothing from a rejected reply is used.

use crate::error::{ProtocolError, Result};
use crate::protocol::{self, ConstPackedSizeBytes, Mode, Packet, ReadBytes, Version, WriteBytes};
use crate::unix_time::Instant;

/// Largest accepted distance between the echoed originate timestamp and the
/// instant the request was sent.
pub const ORIGIN_TOLERANCE_MICROS: i64 = 1_000;

/// Build and serialize a client request stamped with `transmit`.
///
/// Returns the buffer and the transmit timestamp exactly as written, nonce included.
pub fn build_request(
    version: Version,
    transmit: Instant,
) -> Result<([u8; Packet::PACKED_SIZE_BYTES], protocol::TimestampFormat)> {
    let transmit_timestamp = protocol::TimestampFormat::try_from(transmit)?.with_nonce();
    let packet = Packet {
        version,
        mode: Mode::Client,
        transmit_timestamp,
        ..Packet::default()
    };
    let mut send_buf = [0u8; Packet::PACKED_SIZE_BYTES];
    (&mut send_buf[..]).write_bytes(packet)?;
    Ok((send_buf, transmit_timestamp))
}

/// Parse and validate a reply.
///
/// `expected_originate` is the transmit timestamp of the matching request exactly
/// as it went on the wire, nonce included, and `expected_version` the version it
/// carried. Checks, in order:
///
/// 1. at least 48 octets;
/// 2. transmit timestamp non-zero;
/// 3. for server replies, the echoed originate timestamp within 1 ms of what was sent;
/// 4. mode is server or broadcast;
/// 5. version is 1-4, and for server replies equals the request's;
/// 6. stratum is 0-15.
///
/// The leap indicator needs no check of its own: its two bits decode to exactly
/// the four defined values.
pub fn validate_reply(
    buf: &[u8],
    expected_originate: protocol::TimestampFormat,
    expected_version: Version,
) -> Result<Packet> {
    if buf.len() < Packet::PACKED_SIZE_BYTES {
        return Err(ProtocolError::ResponseTooShort {
            received: buf.len(),
        }
        .into());
    }

    // Parse the first 48 bytes (ignoring extension fields/MAC).
    let reply: Packet = (&buf[..Packet::PACKED_SIZE_BYTES]).read_bytes()?;

    if reply.transmit_timestamp.is_zero() {
        return Err(ProtocolError::ZeroTransmitTimestamp.into());
    }

    if reply.mode == Mode::Server {
        let echoed = Instant::from(reply.origin_timestamp);
        let deviation_micros = echoed.micros_since(Instant::from(expected_originate));
        if deviation_micros.unsigned_abs() > ORIGIN_TOLERANCE_MICROS as u64 {
            return Err(ProtocolError::OriginTimestampMismatch { deviation_micros }.into());
        }
    }

    if reply.mode != Mode::Server && reply.mode != Mode::Broadcast {
        return Err(ProtocolError::UnexpectedMode {
            mode: reply.mode as u8,
        }
        .into());
    }

    if !reply.version.is_known()
        || (reply.mode == Mode::Server && reply.version != expected_version)
    {
        return Err(ProtocolError::UnexpectedVersion {
            received: reply.version.value(),
            expected: expected_version.value(),
        }
        .into());
    }

    if !reply.stratum.is_valid() {
        return Err(ProtocolError::InvalidStratum {
            stratum: reply.stratum.0,
        }
        .into());
    }

    Ok(reply)
}

/// One completed round trip: local send instant (T1), the validated reply
/// carrying T2 and T3, and the local receive instant (T4).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// T1, local instant the request was stamped with.
    pub sent: Instant,
    /// The validated reply.
    pub reply: Packet,
    /// T4, local instant the reply was received.
    pub received: Instant,
}

impl Sample {
    /// Clock offset `((T2 - T1) + (T3 - T4)) / 2`, rounded to the nearest microsecond.
    ///
    /// Positive when the local clock is behind the server.
    pub fn offset_micros(&self) -> i64 {
        let (t1, t2, t3, t4) = self.nanos();
        round_micros(((t2 - t1) + (t3 - t4)) / 2)
    }

    /// Round-trip delay `(T4 - T1) - (T3 - T2)`, rounded to the nearest microsecond.
    pub fn delay_micros(&self) -> i64 {
        let (t1, t2, t3, t4) = self.nanos();
        round_micros((t4 - t1) - (t3 - t2))
    }

    fn nanos(&self) -> (i128, i128, i128, i128) {
        (
            self.sent.as_nanos(),
            Instant::from(self.reply.receive_timestamp).as_nanos(),
            Instant::from(self.reply.transmit_timestamp).as_nanos(),
            self.received.as_nanos(),
        )
    }
}

fn round_micros(nanos: i128) -> i64 {
    let micros = if nanos >= 0 {
        (nanos + 500) / 1_000
    } else {
        (nanos - 500) / 1_000
    };
    micros.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
