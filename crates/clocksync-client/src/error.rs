// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for the SNTP client.
//!
//! Every fallible operation returns [`Result<T>`], an alias over [`NtpError`].
//! Callers that live in `io::Result` code can convert with `?`; the original
//! `NtpError` stays reachable through `io::Error::get_ref()`:
//!
//! ```no_run
//! use clocksync_client::error::NtpError;
//! use clocksync_client::{Connector, ConnectorConfig};
//!
//! fn sync() -> std::io::Result<()> {
//!     let config = ConnectorConfig::builder().host("pool.ntp.org").build()?;
//!     Connector::new(config).connect()?;
//!     Ok(())
//! }
//!
//! if let Err(e) = sync() {
//!     if let Some(ntp_err) = e.get_ref().and_then(|inner| inner.downcast_ref::<NtpError>()) {
//!         match ntp_err {
//!             NtpError::Protocol(p) => eprintln!("protocol error: {p}"),
//!             NtpError::Timeout(t) => eprintln!("timeout: {t}"),
//!             _ => eprintln!("SNTP error: {ntp_err}"),
//!         }
//!     }
//! }
//! ```

pub use clocksync_proto::error::ParseError;

use std::fmt;
use std::io;

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, NtpError>;

/// Errors that can occur during SNTP client operations.
///
/// Whatever the variant, a failed cycle leaves the previously committed
/// synchronization state untouched.
#[derive(Debug)]
pub enum NtpError {
    /// The reply failed validation; none of its data was used.
    Protocol(ProtocolError),
    /// No datagram could be sent or received within the per-attempt timeout.
    Timeout(TimeoutError),
    /// Invalid configuration, detected before any I/O.
    Config(ConfigError),
    /// The server raised the leap indicator alarm: its own clock is not synchronized.
    Unsynchronized {
        /// Stratum reported alongside the alarm.
        stratum: u8,
    },
    /// Underlying I/O error (socket bind, DNS resolution, etc.).
    Io(io::Error),
}

/// Reply validation errors, in the order the checks run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// Reply shorter than the 48-octet header.
    ResponseTooShort {
        /// Number of bytes received.
        received: usize,
    },
    /// Server transmit timestamp is zero (unsent).
    ZeroTransmitTimestamp,
    /// The echoed originate timestamp is more than 1 ms away from what was sent.
    OriginTimestampMismatch {
        /// Distance between echoed and sent timestamp, in microseconds.
        deviation_micros: i64,
    },
    /// Reply mode is neither server nor broadcast.
    UnexpectedMode {
        /// The raw mode value.
        mode: u8,
    },
    /// Version outside 1-4, or a server reply that does not echo our version.
    UnexpectedVersion {
        /// Version carried by the reply.
        received: u8,
        /// Version the request was sent with.
        expected: u8,
    },
    /// Stratum above 15.
    InvalidStratum {
        /// The raw stratum value.
        stratum: u8,
    },
    /// A timestamp could not be encoded or decoded.
    Codec(ParseError),
}

/// Timeout errors for SNTP operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeoutError {
    /// Send operation timed out.
    Send,
    /// Receive operation timed out.
    Recv,
}

/// Configuration errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// No server host configured.
    MissingHost,
    /// Request count at or above the engine ceiling.
    InvalidRequestCount {
        /// The rejected count.
        count: u32,
    },
    /// Protocol version other than 3 or 4.
    InvalidVersion {
        /// The rejected version.
        version: u8,
    },
    /// Inter-sample interval of zero.
    NonPositiveInterval,
    /// Address resolved to no socket addresses.
    NoAddresses {
        /// The address that failed to resolve.
        address: String,
    },
}

// Display implementations.

impl fmt::Display for NtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtpError::Protocol(e) => write!(f, "SNTP protocol error: {e}"),
            NtpError::Timeout(e) => write!(f, "SNTP timeout: {e}"),
            NtpError::Config(e) => write!(f, "SNTP config error: {e}"),
            NtpError::Unsynchronized { stratum } => {
                write!(f, "server reports unsynchronized clock (stratum {stratum})")
            }
            NtpError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ResponseTooShort { received } => {
                write!(f, "SNTP response too short ({received} bytes)")
            }
            ProtocolError::ZeroTransmitTimestamp => {
                write!(f, "server transmit timestamp is zero")
            }
            ProtocolError::OriginTimestampMismatch { deviation_micros } => {
                write!(
                    f,
                    "origin timestamp mismatch: off by {deviation_micros} us from our request"
                )
            }
            ProtocolError::UnexpectedMode { mode } => {
                write!(f, "unexpected response mode {mode} (expected server or broadcast)")
            }
            ProtocolError::UnexpectedVersion { received, expected } => {
                write!(f, "unexpected version {received} (sent {expected})")
            }
            ProtocolError::InvalidStratum { stratum } => {
                write!(f, "invalid stratum {stratum}")
            }
            ProtocolError::Codec(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutError::Send => write!(f, "SNTP send timed out"),
            TimeoutError::Recv => write!(f, "SNTP recv timed out"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingHost => write!(f, "a server host is required"),
            ConfigError::InvalidRequestCount { count } => {
                write!(
                    f,
                    "request count {count} must be below {}",
                    crate::config::MAX_REQUEST_COUNT
                )
            }
            ConfigError::InvalidVersion { version } => {
                write!(f, "unsupported protocol version {version} (expected 3 or 4)")
            }
            ConfigError::NonPositiveInterval => {
                write!(f, "request interval must be greater than zero")
            }
            ConfigError::NoAddresses { address } => {
                write!(f, "address resolved to no socket addresses: {address}")
            }
        }
    }
}

// Error trait implementations.

impl std::error::Error for NtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NtpError::Io(e) => Some(e),
            NtpError::Protocol(ProtocolError::Codec(e)) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ProtocolError {}
impl std::error::Error for TimeoutError {}
impl std::error::Error for ConfigError {}

// From conversions.

impl From<NtpError> for io::Error {
    fn from(err: NtpError) -> io::Error {
        let kind = match &err {
            NtpError::Protocol(_) => io::ErrorKind::InvalidData,
            NtpError::Timeout(_) => io::ErrorKind::TimedOut,
            NtpError::Config(_) => io::ErrorKind::InvalidInput,
            NtpError::Unsynchronized { .. } => io::ErrorKind::InvalidData,
            NtpError::Io(e) => e.kind(),
        };
        // Preserve the original io::Error directly for the Io variant.
        if let NtpError::Io(e) = err {
            return e;
        }
        io::Error::new(kind, err)
    }
}

impl From<io::Error> for NtpError {
    fn from(err: io::Error) -> NtpError {
        NtpError::Io(err)
    }
}

impl From<ProtocolError> for NtpError {
    fn from(err: ProtocolError) -> NtpError {
        NtpError::Protocol(err)
    }
}

impl From<ConfigError> for NtpError {
    fn from(err: ConfigError) -> NtpError {
        NtpError::Config(err)
    }
}

impl From<ParseError> for NtpError {
    fn from(err: ParseError) -> NtpError {
        NtpError::Protocol(ProtocolError::Codec(err))
    }
}

/// Classify a socket error: read/write timeouts surface as `WouldBlock` on Unix
/// and `TimedOut` on Windows.
pub(crate) fn socket_error(err: io::Error, during: TimeoutError) -> NtpError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => NtpError::Timeout(during),
        _ => NtpError::Io(err),
    }
}
