// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but clippy flags them as unreachable outside the crate.
#![allow(unreachable_pub)]
#![allow(dead_code)]

use clocksync_client::protocol::{
    LeapIndicator, Mode, Packet, ReadBytes, ReferenceIdentifier, Stratum, TimestampFormat,
    WriteBytes,
};
use clocksync_client::unix_time::Instant;
use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

/// How the mock peer answers.
#[derive(Clone, Copy, Debug)]
pub struct PeerBehavior {
    /// Server clock minus local clock, in microseconds.
    pub offset_micros: i64,
    /// Stratum put in every reply.
    pub stratum: u8,
    /// Leap indicator put in every reply.
    pub leap: LeapIndicator,
    /// Reference identifier put in every reply.
    pub reference_id: [u8; 4],
}

impl Default for PeerBehavior {
    fn default() -> Self {
        PeerBehavior {
            offset_micros: 0,
            stratum: 1,
            leap: LeapIndicator::NoWarning,
            reference_id: *b"GPS\0",
        }
    }
}

/// A loopback SNTP server thread answering up to `replies` requests.
///
/// The thread exits after the last reply or after one second without traffic.
pub fn spawn_peer(behavior: PeerBehavior, replies: usize) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind mock peer");
    socket
        .set_read_timeout(Some(Duration::from_secs(1)))
        .expect("set read timeout");
    let addr = socket.local_addr().expect("local addr");
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        for _ in 0..replies {
            let Ok((len, src)) = socket.recv_from(&mut buf) else {
                return;
            };
            let Ok(request) = (&buf[..len]).read_bytes::<Packet>() else {
                continue;
            };
            let reply = server_reply(&request, behavior);
            let mut out = [0u8; 48];
            (&mut out[..]).write_bytes(reply).expect("encode reply");
            let _ = socket.send_to(&out, src);
        }
    });
    addr
}

/// A bound socket that never answers. Keep it alive for the duration of the test.
pub fn silent_peer() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind silent peer");
    let addr = socket.local_addr().expect("local addr");
    (socket, addr)
}

fn server_reply(request: &Packet, behavior: PeerBehavior) -> Packet {
    let now = Instant::now().saturating_add_micros(behavior.offset_micros);
    let now = TimestampFormat::try_from(now).expect("timestamp in range");
    Packet {
        leap_indicator: behavior.leap,
        version: request.version,
        mode: Mode::Server,
        stratum: Stratum(behavior.stratum),
        poll: request.poll,
        precision: -20,
        reference_id: ReferenceIdentifier(behavior.reference_id),
        reference_timestamp: now,
        origin_timestamp: request.transmit_timestamp,
        receive_timestamp: now,
        transmit_timestamp: now,
        ..Packet::default()
    }
}
