// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Types and constants of the SNTP wire format (RFC 4330, RFC 5905).
//!
//! Provides `ReadBytes` and `WriteBytes` implementations which extend the byteorder crate
//! `WriteBytesExt` and `ReadBytesExt` traits with the ability to read and write the protocol
//! types in network byte order.
//!
//! ```text
//! Offset  Size  Field
//!      0     1  LI(2) VN(3) Mode(3)
//!      1     1  Stratum
//!      2     1  Poll interval (log2 s)
//!      3     1  Precision (signed log2 s)
//!      4     4  Root delay (16.16)
//!      8     4  Root dispersion (16.16)
//!     12     4  Reference identifier
//!     16     8  Reference timestamp (32.32)
//!     24     8  Originate timestamp
//!     32     8  Receive timestamp
//!     40     8  Transmit timestamp
//! ```

/// Default SNTP server port.
pub const PORT: u16 = 123;

/// Highest stratum a usable server may report.
pub const MAX_STRATUM: u8 = 15;

/// Size of an SNTP packet without extension fields or MAC.
pub const PACKET_SIZE: usize = 48;

mod io;
mod traits;
mod types;

pub use self::traits::*;
pub use self::types::*;
