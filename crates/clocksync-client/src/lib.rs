// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Blocking SNTP client engine with an interpolating clock.

A [`Connector`] runs a configurable number of request/reply round trips
against one server, averages the measured clock offset and commits it. Between
synchronizations [`Connector::current_time`] answers from a monotonic local
clock plus the committed offset, without touching the network. Corrections
that would move the reported time backward are spread over the configured
clock-shift window so readings never regress.

# Example

```rust,no_run
use clocksync_client::{Connector, ConnectorConfig};
use std::time::Duration;

fn main() -> clocksync_client::Result<()> {
    let config = ConnectorConfig::builder()
        .host("time.nist.gov")
        .request_count(3)
        .request_interval(Duration::from_secs(2))
        .clock_shift_window(Duration::from_secs(30))
        .build()?;
    let connector = Connector::new(config);
    let now = connector.connect()?;
    println!("{}.{:09}", now.secs(), now.subsec_nanos());
    Ok(())
}
```
*/

#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export protocol types from clocksync_proto for convenience.
pub use clocksync_proto::{protocol, unix_time};

/// Error types for the SNTP client.
pub mod error;

/// Immutable connector configuration and its builder.
pub mod config;

/// Request building, reply validation and per-sample arithmetic.
pub mod request;

/// The multi-sample round-trip estimator.
pub mod estimator;

/// Interruptible sleeping between samples.
pub mod interrupt;

/// Transports: the strategy seam between the connector and the network.
pub mod transport;

/// Local clocks and the interpolating clock façade.
pub mod clock;

/// The connect / average / smooth life-cycle.
pub mod connector;

pub use clock::{LocalClock, ManualClock, MonotonicClock, SyncedClock, TimeSource};
pub use config::{ConnectorConfig, ConnectorConfigBuilder};
pub use connector::{Connector, SyncState};
pub use error::{NtpError, Result};
pub use estimator::{Estimate, StopReason};
pub use interrupt::Interrupt;
pub use transport::{Datagram, SntpTransport, Transport};
