// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! SNTP protocol types and the fixed-point time codec.
//!
//! This crate provides the foundational types shared by every SNTP client in
//! the workspace: the 48-octet packet layout (RFC 4330 / RFC 5905), the
//! 64-bit NTP timestamp with its 2036 rollover rule, and the [`unix_time::Instant`]
//! type the rest of the engine computes with.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Error types for packet parsing and timestamp conversion.
pub mod error;

/// SNTP protocol types and constants.
pub mod protocol;

/// Conversions between NTP timestamps and Unix [`Instant`](unix_time::Instant)s.
///
/// Handles the two-epoch rule: the most significant bit of the seconds field
/// selects between the 1900 and the 2036 base.
pub mod unix_time;
