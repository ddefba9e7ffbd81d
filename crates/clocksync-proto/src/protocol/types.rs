// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::net::Ipv4Addr;

use super::{ConstPackedSizeBytes, MAX_STRATUM};

/// **Short Format** - the 16.16 fixed-point seconds used for root delay and root dispersion.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Seconds              |           Fraction            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShortFormat {
    /// Seconds component (16-bit unsigned).
    pub seconds: u16,
    /// Fractional seconds component (16-bit unsigned).
    pub fraction: u16,
}

/// **Timestamp Format** - 32 integer and 32 fractional bits counting seconds since
/// 1900-01-01T00:00:00Z.
///
/// The 32-bit seconds field wraps on 2036-02-07T06:28:16Z. Following RFC 4330 section 3, a
/// value whose most significant bit is set belongs to the era based at 1900; a value with the
/// bit clear belongs to the era based at 2036. See [`crate::unix_time`] for the conversions.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Seconds                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Fraction                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimestampFormat {
    /// Seconds relative to the era base.
    pub seconds: u32,
    /// Fractional seconds (resolution of ~232 picoseconds).
    pub fraction: u32,
}

/// A 2-bit integer warning of an impending leap second, or of an unsynchronized server.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LeapIndicator {
    /// No leap required.
    #[default]
    NoWarning = 0,
    /// Last minute of the day has 61 seconds.
    AddOne = 1,
    /// Last minute of the day has 59 seconds.
    SubOne = 2,
    /// Alarm condition: the server clock is not synchronized.
    Unknown = 3,
}

impl TryFrom<u8> for LeapIndicator {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LeapIndicator::NoWarning),
            1 => Ok(LeapIndicator::AddOne),
            2 => Ok(LeapIndicator::SubOne),
            3 => Ok(LeapIndicator::Unknown),
            _ => Err(()),
        }
    }
}

impl LeapIndicator {
    /// Whether the server signals the alarm (unsynchronized) condition.
    pub fn is_alarm(&self) -> bool {
        *self == LeapIndicator::Unknown
    }

    /// Whether a leap second is scheduled for the end of the current month.
    pub fn is_leap_pending(&self) -> bool {
        matches!(self, LeapIndicator::AddOne | LeapIndicator::SubOne)
    }
}

/// A 3-bit integer representing the protocol version number.
///
/// Values read off the wire are kept as-is so validation can reject them; the
/// public constructor only admits the versions SNTP defines (1 to 4).
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(pub(crate) u8);

/// A 3-bit integer representing the association mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Reserved mode (value 0).
    Reserved = 0,
    /// Symmetric active mode (value 1).
    SymmetricActive = 1,
    /// Symmetric passive mode (value 2).
    SymmetricPassive = 2,
    /// Client mode (value 3).
    #[default]
    Client = 3,
    /// Server mode (value 4).
    Server = 4,
    /// Broadcast mode (value 5).
    Broadcast = 5,
    /// Control message mode (value 6).
    NtpControlMessage = 6,
    /// Reserved for private use (value 7).
    ReservedForPrivateUse = 7,
}

impl TryFrom<u8> for Mode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Reserved),
            1 => Ok(Mode::SymmetricActive),
            2 => Ok(Mode::SymmetricPassive),
            3 => Ok(Mode::Client),
            4 => Ok(Mode::Server),
            5 => Ok(Mode::Broadcast),
            6 => Ok(Mode::NtpControlMessage),
            7 => Ok(Mode::ReservedForPrivateUse),
            _ => Err(()),
        }
    }
}

/// An 8-bit integer representing the stratum.
///
/// ```ignore
/// +--------+-----------------------------------------------------+
/// | Value  | Meaning                                             |
/// +--------+-----------------------------------------------------+
/// | 0      | kiss-of-death                                       |
/// | 1      | primary server (e.g., equipped with a GPS receiver) |
/// | 2-15   | secondary server (via NTP)                          |
/// | 16-255 | unsynchronized or reserved, rejected by the client  |
/// +--------+-----------------------------------------------------+
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Stratum(pub u8);

/// The four octets of the reference identifier, kept opaque.
///
/// Their meaning depends on stratum and version (kiss code, reference clock name,
/// IPv4 address or the leading octets of an address hash). [`ReferenceIdentifier::interpret`]
/// gives a best-effort reading for diagnostics; nothing in the client acts on it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ReferenceIdentifier(pub [u8; 4]);

/// Best-effort reading of a [`ReferenceIdentifier`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RefIdHint {
    /// Stratum 0: a kiss code.
    KissCode(KissOfDeath),
    /// Stratum 1: left-justified, zero-padded ASCII name of the reference clock.
    ReferenceClock([u8; 4]),
    /// Stratum 2-15 before version 4: the IPv4 address of the upstream server.
    Ipv4(Ipv4Addr),
    /// Stratum 2-15 from version 4 on: an IPv4 address or the first four octets of the
    /// MD5 hash of an IPv6 address. The two are indistinguishable on the wire.
    AddressOrHash([u8; 4]),
    /// Anything else.
    Unknown([u8; 4]),
}

/// Kiss codes carried by stratum-0 replies.
///
/// Clients receiving a kiss-of-death must stop or slow down querying that server.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KissOfDeath {
    /// Access denied; stop sending packets to this server.
    Deny,
    /// Access restricted; stop sending packets to this server.
    Rstr,
    /// Rate exceeded; reduce the polling interval.
    Rate,
    /// Any other four-character code.
    Other([u8; 4]),
}

impl From<[u8; 4]> for KissOfDeath {
    fn from(code: [u8; 4]) -> Self {
        match &code {
            b"DENY" => KissOfDeath::Deny,
            b"RSTR" => KissOfDeath::Rstr,
            b"RATE" => KissOfDeath::Rate,
            _ => KissOfDeath::Other(code),
        }
    }
}

/// **Packet Header** - the fixed 48-octet SNTP message.
///
/// A request is built fresh for every round trip and only its transmit timestamp is filled in.
/// A reply is only trusted after the client has validated it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Packet {
    /// Leap indicator warning of impending leap second.
    pub leap_indicator: LeapIndicator,
    /// Protocol version number.
    pub version: Version,
    /// Association mode (client, server, broadcast, etc.).
    pub mode: Mode,
    /// Stratum level of the time source.
    pub stratum: Stratum,
    /// Maximum interval between successive messages, in log2 seconds.
    pub poll: i8,
    /// Precision of the server clock, in log2 seconds.
    pub precision: i8,
    /// Total round-trip delay to the reference clock.
    pub root_delay: ShortFormat,
    /// Total dispersion to the reference clock.
    pub root_dispersion: ShortFormat,
    /// Reference identifier (clock source or server address).
    pub reference_id: ReferenceIdentifier,
    /// Time when the server clock was last set or corrected.
    pub reference_timestamp: TimestampFormat,
    /// Time at the client when the request departed for the server (T1, echoed).
    pub origin_timestamp: TimestampFormat,
    /// Time at the server when the request arrived from the client (T2).
    pub receive_timestamp: TimestampFormat,
    /// Time at the server when the reply left for the client (T3).
    pub transmit_timestamp: TimestampFormat,
}

/// The consecutive types within the first packed byte of the packet.
pub type PacketByte1 = (LeapIndicator, Version, Mode);

// Inherent implementations.

impl ShortFormat {
    /// The value in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.fraction as f64 / 65536.0
    }

    /// The value in whole microseconds (truncated).
    pub fn as_micros(&self) -> i64 {
        let raw = ((self.seconds as i64) << 16) | self.fraction as i64;
        (raw * 1_000_000) >> 16
    }
}

impl TimestampFormat {
    /// The all-zero timestamp, meaning "not set".
    pub const ZERO: Self = TimestampFormat {
        seconds: 0,
        fraction: 0,
    };

    /// Whether both halves are zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Whether the value belongs to the era based at 1900 (most significant bit set).
    pub fn is_era0(&self) -> bool {
        self.seconds & 0x8000_0000 != 0
    }

    /// Returns a copy with the least significant fraction byte replaced by a random value.
    ///
    /// Only used for the transmit field of outgoing requests, where the low bits act as a
    /// nonce that an off-path attacker has to guess. The change is below one nanosecond.
    pub fn with_nonce(self) -> Self {
        TimestampFormat {
            seconds: self.seconds,
            fraction: (self.fraction & !0xff) | rand::random::<u8>() as u32,
        }
    }
}

impl ReferenceIdentifier {
    /// Returns the raw 4-byte representation of the reference identifier.
    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Best-effort interpretation given the stratum and version of the packet it came from.
    pub fn interpret(&self, stratum: Stratum, version: Version) -> RefIdHint {
        let bytes = self.0;
        if stratum.is_kiss_of_death() {
            RefIdHint::KissCode(KissOfDeath::from(bytes))
        } else if stratum == Stratum::PRIMARY {
            RefIdHint::ReferenceClock(bytes)
        } else if stratum.is_secondary() && version < Version::V4 {
            RefIdHint::Ipv4(Ipv4Addr::from(bytes))
        } else if stratum.is_secondary() {
            RefIdHint::AddressOrHash(bytes)
        } else {
            RefIdHint::Unknown(bytes)
        }
    }
}

impl Version {
    /// Version 1.
    pub const V1: Self = Version(1);
    /// Version 2.
    pub const V2: Self = Version(2);
    /// Version 3.
    pub const V3: Self = Version(3);
    /// Version 4 (current standard).
    pub const V4: Self = Version(4);

    /// Create a `Version` from a raw version number.
    ///
    /// Returns `None` if the value is outside the valid range (1-4).
    pub fn new(v: u8) -> Option<Self> {
        if (1..=4).contains(&v) {
            Some(Version(v))
        } else {
            None
        }
    }

    /// Returns the raw version number as a `u8`.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether or not the version is one SNTP defines.
    pub fn is_known(&self) -> bool {
        self.0 >= 1 && self.0 <= 4
    }
}

impl Stratum {
    /// Kiss-of-death (also "unspecified or invalid").
    pub const KISS_OF_DEATH: Self = Stratum(0);
    /// The primary server (e.g. equipped with a GPS receiver).
    pub const PRIMARY: Self = Stratum(1);
    /// The minimum value specifying a secondary server.
    pub const SECONDARY_MIN: Self = Stratum(2);
    /// The maximum value specifying a secondary server.
    pub const SECONDARY_MAX: Self = Stratum(MAX_STRATUM);
    /// An unsynchronized stratum.
    pub const UNSYNCHRONIZED: Self = Stratum(16);

    /// Whether the server asks the client to go away.
    pub fn is_kiss_of_death(&self) -> bool {
        *self == Self::KISS_OF_DEATH
    }

    /// Whether or not the stratum represents a secondary server.
    pub fn is_secondary(&self) -> bool {
        Self::SECONDARY_MIN <= *self && *self <= Self::SECONDARY_MAX
    }

    /// Whether the stratum is in the range a client accepts (0-15).
    pub fn is_valid(&self) -> bool {
        self.0 <= MAX_STRATUM
    }
}

// Size implementations.

impl ConstPackedSizeBytes for ShortFormat {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for TimestampFormat {
    const PACKED_SIZE_BYTES: usize = 8;
}

impl ConstPackedSizeBytes for Stratum {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for ReferenceIdentifier {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for PacketByte1 {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for Packet {
    const PACKED_SIZE_BYTES: usize = PacketByte1::PACKED_SIZE_BYTES
        + Stratum::PACKED_SIZE_BYTES
        + 2
        + ShortFormat::PACKED_SIZE_BYTES * 2
        + ReferenceIdentifier::PACKED_SIZE_BYTES
        + TimestampFormat::PACKED_SIZE_BYTES * 4;
}

// Default implementations.

impl Default for Version {
    /// Defaults to version 4 (RFC 5905).
    fn default() -> Self {
        Version::V4
    }
}

impl Default for Packet {
    /// Defaults to a version 4 client request with every field zeroed.
    fn default() -> Self {
        Packet {
            leap_indicator: LeapIndicator::default(),
            version: Version::default(),
            mode: Mode::default(),
            stratum: Stratum::default(),
            poll: 0,
            precision: 0,
            root_delay: ShortFormat::default(),
            root_dispersion: ShortFormat::default(),
            reference_id: ReferenceIdentifier::default(),
            reference_timestamp: TimestampFormat::default(),
            origin_timestamp: TimestampFormat::default(),
            receive_timestamp: TimestampFormat::default(),
            transmit_timestamp: TimestampFormat::default(),
        }
    }
}

// Display implementations.

impl fmt::Display for ReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = self
            .0
            .iter()
            .take_while(|&&b| b != 0)
            .all(|b| b.is_ascii_graphic() || *b == b' ');
        if printable && self.0[0] != 0 {
            for &b in self.0.iter().take_while(|&&b| b != 0) {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "{}", Ipv4Addr::from(self.0))
        }
    }
}

impl fmt::Display for KissOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KissOfDeath::Deny => write!(f, "DENY"),
            KissOfDeath::Rstr => write!(f, "RSTR"),
            KissOfDeath::Rate => write!(f, "RATE"),
            KissOfDeath::Other(code) => write!(f, "{}", ReferenceIdentifier(*code)),
        }
    }
}
