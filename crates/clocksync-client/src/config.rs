// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::protocol::{self, Version};

/// Default per-attempt send/receive timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause between two samples of one cycle.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(60);

/// Request counts must stay strictly below this ceiling.
pub const MAX_REQUEST_COUNT: u32 = 1000;

/// Immutable connector configuration.
///
/// Built with [`ConnectorConfig::builder`]; every constraint is checked once in
/// [`ConnectorConfigBuilder::build`] so a cycle never starts with bad settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectorConfig {
    host: String,
    port: u16,
    timeout: Duration,
    version: Version,
    request_count: u32,
    request_interval: Duration,
    clock_shift_window: Duration,
}

impl ConnectorConfig {
    /// Create a builder with all defaults and no host.
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::new()
    }

    /// Server host name or address literal.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, as used for resolution and in messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-attempt send/receive timeout. `Duration::ZERO` means no timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Protocol version requests are sent with.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Number of round trips per cycle. Zero disables the network entirely.
    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    /// Pause between samples.
    pub fn request_interval(&self) -> Duration {
        self.request_interval
    }

    /// Window over which a backward correction is phased in. Zero applies it at once.
    pub fn clock_shift_window(&self) -> Duration {
        self.clock_shift_window
    }
}

/// Builder for [`ConnectorConfig`].
#[derive(Clone, Debug)]
pub struct ConnectorConfigBuilder {
    host: Option<String>,
    port: u16,
    timeout: Duration,
    version: u8,
    request_count: u32,
    request_interval: Duration,
    clock_shift_window: Duration,
}

impl ConnectorConfigBuilder {
    fn new() -> Self {
        ConnectorConfigBuilder {
            host: None,
            port: protocol::PORT,
            timeout: DEFAULT_TIMEOUT,
            version: Version::V4.value(),
            request_count: 1,
            request_interval: DEFAULT_REQUEST_INTERVAL,
            clock_shift_window: Duration::ZERO,
        }
    }

    /// Set the server host name or address literal (required).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port (default: 123).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-attempt timeout (default: 5s). `Duration::ZERO` blocks indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the protocol version, 3 or 4 (default: 4).
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Set the number of round trips per cycle, 0 to 999 (default: 1).
    pub fn request_count(mut self, count: u32) -> Self {
        self.request_count = count;
        self
    }

    /// Set the pause between samples (default: 60s). Must be non-zero.
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Set the clock-shift window (default: zero, corrections apply at once).
    pub fn clock_shift_window(mut self, window: Duration) -> Self {
        self.clock_shift_window = window;
        self
    }

    /// Validate the settings and produce the configuration.
    pub fn build(self) -> Result<ConnectorConfig> {
        let host = match self.host {
            Some(host) if !host.trim().is_empty() => host,
            _ => return Err(ConfigError::MissingHost.into()),
        };
        let version = match Version::new(self.version) {
            Some(v) if v >= Version::V3 => v,
            _ => {
                return Err(ConfigError::InvalidVersion {
                    version: self.version,
                }
                .into());
            }
        };
        if self.request_count >= MAX_REQUEST_COUNT {
            return Err(ConfigError::InvalidRequestCount {
                count: self.request_count,
            }
            .into());
        }
        if self.request_interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval.into());
        }
        Ok(ConnectorConfig {
            host,
            port: self.port,
            timeout: self.timeout,
            version,
            request_count: self.request_count,
            request_interval: self.request_interval,
            clock_shift_window: self.clock_shift_window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NtpError;

    fn config_error(result: Result<ConnectorConfig>) -> ConfigError {
        match result {
            Err(NtpError::Config(e)) => e,
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let config = ConnectorConfig::builder().host("time.example").build().unwrap();
        assert_eq!(config.host(), "time.example");
        assert_eq!(config.port(), 123);
        assert_eq!(config.address(), "time.example:123");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.version(), Version::V4);
        assert_eq!(config.request_count(), 1);
        assert_eq!(config.request_interval(), Duration::from_secs(60));
        assert_eq!(config.clock_shift_window(), Duration::ZERO);
    }

    #[test]
    fn host_is_required() {
        assert_eq!(
            config_error(ConnectorConfig::builder().build()),
            ConfigError::MissingHost
        );
        assert_eq!(
            config_error(ConnectorConfig::builder().host("  ").build()),
            ConfigError::MissingHost
        );
    }

    #[test]
    fn request_count_ceiling() {
        let ok = ConnectorConfig::builder()
            .host("h")
            .request_count(999)
            .build()
            .unwrap();
        assert_eq!(ok.request_count(), 999);
        assert!(
            ConnectorConfig::builder()
                .host("h")
                .request_count(0)
                .build()
                .is_ok()
        );
        assert_eq!(
            config_error(ConnectorConfig::builder().host("h").request_count(1000).build()),
            ConfigError::InvalidRequestCount { count: 1000 }
        );
    }

    #[test]
    fn only_versions_three_and_four() {
        for version in [3, 4] {
            let config = ConnectorConfig::builder()
                .host("h")
                .version(version)
                .build()
                .unwrap();
            assert_eq!(config.version().value(), version);
        }
        for version in [0, 1, 2, 5, 7] {
            assert_eq!(
                config_error(ConnectorConfig::builder().host("h").version(version).build()),
                ConfigError::InvalidVersion { version }
            );
        }
    }

    #[test]
    fn interval_must_be_positive() {
        assert_eq!(
            config_error(
                ConnectorConfig::builder()
                    .host("h")
                    .request_interval(Duration::ZERO)
                    .build()
            ),
            ConfigError::NonPositiveInterval
        );
    }

    #[test]
    fn zero_timeout_is_allowed() {
        let config = ConnectorConfig::builder()
            .host("h")
            .timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert!(config.timeout().is_zero());
    }
}
