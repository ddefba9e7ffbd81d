// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The strategy seam between the connector and a concrete time source.
//!
//! A [`Transport`] turns a configuration into an [`Estimate`]; the connector
//! owns everything around it (validation of the request count, committing,
//! smoothing). [`SntpTransport`] is the UDP implementation. Other sources that
//! read a timestamp off a text stream or an HTTP header would plug in here.

use log::debug;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::clock::LocalClock;
use crate::config::ConnectorConfig;
use crate::error::{ConfigError, Result};
use crate::estimator::{self, Estimate};
use crate::interrupt::Interrupt;

/// A connected, message-oriented socket.
pub trait Datagram {
    /// Send one datagram to the connected peer.
    fn send(&self, buf: &[u8]) -> io::Result<usize>;
    /// Receive one datagram from the connected peer.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

impl Datagram for UdpSocket {
    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, buf)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        UdpSocket::recv(self, buf)
    }
}

/// Leaf exchange logic of one kind of time source.
pub trait Transport: Send + Sync {
    /// Run one estimation cycle. Only called with a non-zero request count.
    fn exchange(
        &self,
        config: &ConnectorConfig,
        clock: &dyn LocalClock,
        interrupt: &Interrupt,
    ) -> Result<Estimate>;
}

/// SNTP over UDP.
#[derive(Clone, Copy, Debug, Default)]
pub struct SntpTransport;

impl Transport for SntpTransport {
    fn exchange(
        &self,
        config: &ConnectorConfig,
        clock: &dyn LocalClock,
        interrupt: &Interrupt,
    ) -> Result<Estimate> {
        let target_addr = resolve(config)?;

        // Connecting makes the OS drop datagrams from any other source.
        let sock = UdpSocket::bind(bind_addr_for(&target_addr))?;
        sock.connect(target_addr)?;
        let timeout = Some(config.timeout()).filter(|t| !t.is_zero());
        sock.set_read_timeout(timeout)?;
        sock.set_write_timeout(timeout)?;
        debug!("{:?} -> {}", sock.local_addr(), target_addr);

        estimator::run_cycle(&sock, config, clock, interrupt)
    }
}

fn resolve(config: &ConnectorConfig) -> Result<SocketAddr> {
    let address = config.address();
    let mut addrs = (config.host(), config.port()).to_socket_addrs()?;
    addrs
        .next()
        .ok_or_else(|| ConfigError::NoAddresses { address }.into())
}

/// Select the wildcard bind address of the target's address family.
pub(crate) fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}
