// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for SNTP packet parsing and timestamp conversion.
//!
//! [`ParseError`] carries no heap data. It implements [`std::error::Error`] and
//! converts into [`std::io::Error`] so it can flow through the byteorder based
//! readers and writers.

use std::fmt;

/// Errors that can occur while decoding or encoding SNTP data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The buffer is too short for the expected data.
    BufferTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// An invalid or unrecognized field value was encountered.
    InvalidField {
        /// Name of the field that was invalid.
        field: &'static str,
        /// The invalid value.
        value: u32,
    },
    /// The instant lies outside the window the 64-bit timestamp can represent
    /// (1968-01-20T03:14:08Z up to, excluding, 2104-02-26T09:42:24Z).
    TimestampOutOfRange {
        /// Unix seconds of the rejected instant.
        unix_secs: i64,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BufferTooShort { needed, available } => {
                write!(
                    f,
                    "buffer too short: needed {} bytes, got {}",
                    needed, available
                )
            }
            ParseError::InvalidField { field, value } => {
                write!(f, "invalid {} value: {}", field, value)
            }
            ParseError::TimestampOutOfRange { unix_secs } => {
                write!(
                    f,
                    "instant {} (unix seconds) is outside the NTP timestamp range",
                    unix_secs
                )
            }
        }
    }
}

impl From<ParseError> for std::io::Error {
    fn from(err: ParseError) -> std::io::Error {
        let kind = match &err {
            ParseError::BufferTooShort { .. } => std::io::ErrorKind::UnexpectedEof,
            ParseError::InvalidField { .. } => std::io::ErrorKind::InvalidData,
            ParseError::TimestampOutOfRange { .. } => std::io::ErrorKind::InvalidInput,
        };
        std::io::Error::new(kind, err)
    }
}

impl std::error::Error for ParseError {}
