// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The multi-sample round-trip estimator.
//!
//! One cycle sends up to `request_count` requests, strictly one after the
//! other, and folds each validated reply into a running average of the clock
//! offset. A kiss-of-death reply ends the cycle after it has been folded in;
//! an interrupted pause ends it with the samples gathered so far. A server
//! raising the leap indicator alarm aborts the whole cycle.

use log::{debug, warn};

use crate::clock::LocalClock;
use crate::config::ConnectorConfig;
use crate::error::{NtpError, Result, TimeoutError, socket_error};
use crate::interrupt::{Interrupt, Sleep};
use crate::protocol::{KissOfDeath, LeapIndicator, Packet};
use crate::request::{self, Sample};
use crate::transport::Datagram;

/// Receive buffer size; large enough for extension fields we ignore.
const RECV_BUF_SIZE: usize = 1024;

/// Why a cycle stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// Every configured sample was taken.
    Completed,
    /// The server answered with stratum 0.
    KissOfDeath,
    /// The pause between samples was interrupted.
    Interrupted,
    /// The request count was zero; the network was never used.
    NoRequests,
}

/// The outcome of one cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    /// Running average of the per-sample offsets, in microseconds.
    pub average_offset_micros: i64,
    /// Number of samples folded into the average.
    pub samples: u32,
    /// Leap indicator of the last reply.
    pub leap: LeapIndicator,
    /// The last validated reply, for diagnostics.
    pub last_reply: Option<Packet>,
    /// Smallest round-trip delay observed, in microseconds.
    pub min_delay_micros: Option<i64>,
    /// Why the cycle stopped.
    pub stop: StopReason,
}

impl Estimate {
    /// The zero-offset estimate of a cycle configured with no requests.
    pub fn passthrough() -> Self {
        Estimate {
            average_offset_micros: 0,
            samples: 0,
            leap: LeapIndicator::NoWarning,
            last_reply: None,
            min_delay_micros: None,
            stop: StopReason::NoRequests,
        }
    }
}

/// Run one estimation cycle over a connected datagram socket.
pub fn run_cycle<D>(
    socket: &D,
    config: &ConnectorConfig,
    clock: &dyn LocalClock,
    interrupt: &Interrupt,
) -> Result<Estimate>
where
    D: Datagram + ?Sized,
{
    let count = config.request_count();
    if count == 0 {
        return Ok(Estimate::passthrough());
    }

    let mut estimate = Estimate {
        stop: StopReason::Completed,
        ..Estimate::passthrough()
    };
    let mut cumulative_micros: i64 = 0;
    let mut recv_buf = [0u8; RECV_BUF_SIZE];

    for i in 1..=count {
        let sample = exchange_one(socket, config, clock, &mut recv_buf)?;
        let offset = sample.offset_micros();
        let delay = sample.delay_micros();

        cumulative_micros = cumulative_micros.saturating_add(offset);
        estimate.samples = i;
        estimate.average_offset_micros = cumulative_micros / i as i64;
        estimate.leap = sample.reply.leap_indicator;
        estimate.last_reply = Some(sample.reply);
        estimate.min_delay_micros = Some(estimate.min_delay_micros.map_or(delay, |d| d.min(delay)));
        debug!(
            "sample {}/{}: offset={}us delay={}us average={}us stratum={}",
            i, count, offset, delay, estimate.average_offset_micros, sample.reply.stratum.0
        );

        if sample.reply.leap_indicator.is_alarm() {
            return Err(NtpError::Unsynchronized {
                stratum: sample.reply.stratum.0,
            });
        }

        if sample.reply.stratum.is_kiss_of_death() {
            let reply = sample.reply;
            warn!(
                "kiss-of-death from {} ({}), stopping after sample {}/{}",
                config.address(),
                KissOfDeath::from(reply.reference_id.as_bytes()),
                i,
                count
            );
            estimate.stop = StopReason::KissOfDeath;
            break;
        }

        if i != 1 && i != count && interrupt.sleep(config.request_interval()) == Sleep::Interrupted
        {
            debug!("interrupted after sample {}/{}", i, count);
            estimate.stop = StopReason::Interrupted;
            break;
        }
    }

    Ok(estimate)
}

/// One request/reply round trip.
fn exchange_one<D>(
    socket: &D,
    config: &ConnectorConfig,
    clock: &dyn LocalClock,
    recv_buf: &mut [u8],
) -> Result<Sample>
where
    D: Datagram + ?Sized,
{
    let sent = clock.now();
    let (send_buf, transmit) = request::build_request(config.version(), sent)?;
    let sz = socket
        .send(&send_buf)
        .map_err(|e| socket_error(e, TimeoutError::Send))?;
    debug!("sent: {}", sz);

    let recv_len = socket
        .recv(recv_buf)
        .map_err(|e| socket_error(e, TimeoutError::Recv))?;
    // Record T4 immediately.
    let received = clock.now();
    debug!("recv: {} bytes", recv_len);

    let reply = request::validate_reply(&recv_buf[..recv_len], transmit, config.version())?;
    Ok(Sample {
        sent,
        reply,
        received,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ProtocolError;
    use crate::protocol::{
        Mode, ReadBytes, ReferenceIdentifier, Stratum, TimestampFormat, Version, WriteBytes,
    };
    use crate::unix_time::Instant;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    /// What the scripted peer does with one request.
    #[derive(Clone, Copy)]
    enum Reply {
        /// Answer as a server `offset` microseconds ahead of the local clock.
        Offset {
            offset_micros: i64,
            stratum: u8,
            leap: LeapIndicator,
        },
        /// Let the receive time out.
        Silence,
    }

    fn ok(offset_micros: i64) -> Reply {
        Reply::Offset {
            offset_micros,
            stratum: 1,
            leap: LeapIndicator::NoWarning,
        }
    }

    /// An in-memory peer that answers instantly from a script.
    struct ScriptedPeer {
        clock: Arc<ManualClock>,
        script: Mutex<VecDeque<Reply>>,
        pending: Mutex<Option<Packet>>,
        sent: Mutex<u32>,
    }

    impl ScriptedPeer {
        fn new(clock: Arc<ManualClock>, script: &[Reply]) -> Self {
            ScriptedPeer {
                clock,
                script: Mutex::new(script.iter().copied().collect()),
                pending: Mutex::new(None),
                sent: Mutex::new(0),
            }
        }

        fn requests(&self) -> u32 {
            *self.sent.lock()
        }
    }

    impl Datagram for ScriptedPeer {
        fn send(&self, buf: &[u8]) -> io::Result<usize> {
            let request: Packet = (&buf[..]).read_bytes()?;
            assert_eq!(request.mode, Mode::Client);
            *self.sent.lock() += 1;
            *self.pending.lock() = Some(request);
            Ok(buf.len())
        }

        fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
            let request = self.pending.lock().take().expect("recv without send");
            let step = self.script.lock().pop_front().expect("script exhausted");
            let (offset_micros, stratum, leap) = match step {
                Reply::Offset {
                    offset_micros,
                    stratum,
                    leap,
                } => (offset_micros, stratum, leap),
                Reply::Silence => return Err(io::ErrorKind::WouldBlock.into()),
            };
            let server_now = self.clock.now().saturating_add_micros(offset_micros);
            let server_ts = TimestampFormat::try_from(server_now).unwrap();
            let reply = Packet {
                leap_indicator: leap,
                version: request.version,
                mode: Mode::Server,
                stratum: Stratum(stratum),
                reference_id: if stratum == 0 {
                    ReferenceIdentifier(*b"RATE")
                } else {
                    ReferenceIdentifier(*b"GPS\0")
                },
                origin_timestamp: request.transmit_timestamp,
                receive_timestamp: server_ts,
                transmit_timestamp: server_ts,
                ..Packet::default()
            };
            (&mut buf[..48]).write_bytes(reply)?;
            Ok(48)
        }
    }

    fn config(count: u32) -> ConnectorConfig {
        ConnectorConfig::builder()
            .host("scripted")
            .request_count(count)
            .request_interval(Duration::from_millis(1))
            .build()
            .unwrap()
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Instant::new(1_700_000_000, 0).unwrap(),
        ))
    }

    #[test]
    fn running_average_is_cumulative() {
        let clock = clock();
        let peer = ScriptedPeer::new(clock.clone(), &[ok(400_000), ok(600_000)]);
        let estimate = run_cycle(&peer, &config(2), &*clock, &Interrupt::new()).unwrap();
        assert_eq!(estimate.samples, 2);
        assert_eq!(estimate.average_offset_micros, 500_000);

        // +0.4, +0.6, +0.5: the average of all three, not of the last two.
        let peer = ScriptedPeer::new(clock.clone(), &[ok(400_000), ok(600_000), ok(500_000)]);
        let estimate = run_cycle(&peer, &config(3), &*clock, &Interrupt::new()).unwrap();
        assert_eq!(estimate.samples, 3);
        assert_eq!(estimate.average_offset_micros, 500_000);
        assert_eq!(estimate.stop, StopReason::Completed);
        assert_eq!(estimate.min_delay_micros, Some(0));
        assert!(estimate.last_reply.is_some());
    }

    #[test]
    fn kiss_of_death_on_round_two_of_five() {
        let clock = clock();
        let kod = Reply::Offset {
            offset_micros: 200_000,
            stratum: 0,
            leap: LeapIndicator::NoWarning,
        };
        let peer = ScriptedPeer::new(
            clock.clone(),
            &[ok(400_000), kod, ok(1), ok(1), ok(1)],
        );
        let estimate = run_cycle(&peer, &config(5), &*clock, &Interrupt::new()).unwrap();
        assert_eq!(peer.requests(), 2);
        assert_eq!(estimate.samples, 2);
        assert_eq!(estimate.stop, StopReason::KissOfDeath);
        assert_eq!(estimate.average_offset_micros, 300_000);
    }

    #[test]
    fn alarm_aborts_cycle() {
        let clock = clock();
        let alarm = Reply::Offset {
            offset_micros: 0,
            stratum: 2,
            leap: LeapIndicator::Unknown,
        };
        let peer = ScriptedPeer::new(clock.clone(), &[ok(400_000), alarm, ok(1)]);
        let result = run_cycle(&peer, &config(3), &*clock, &Interrupt::new());
        assert!(matches!(result, Err(NtpError::Unsynchronized { stratum: 2 })));
        assert_eq!(peer.requests(), 2);
    }

    #[test]
    fn alarm_with_stratum_zero_is_still_an_error() {
        let clock = clock();
        let alarm = Reply::Offset {
            offset_micros: 0,
            stratum: 0,
            leap: LeapIndicator::Unknown,
        };
        let peer = ScriptedPeer::new(clock.clone(), &[alarm]);
        let result = run_cycle(&peer, &config(1), &*clock, &Interrupt::new());
        assert!(matches!(result, Err(NtpError::Unsynchronized { stratum: 0 })));
    }

    #[test]
    fn interruption_keeps_partial_average() {
        let clock = clock();
        let peer = ScriptedPeer::new(
            clock.clone(),
            &[ok(100_000), ok(300_000), ok(1), ok(1), ok(1)],
        );
        let config = ConnectorConfig::builder()
            .host("scripted")
            .request_count(5)
            .request_interval(Duration::from_secs(3600))
            .build()
            .unwrap();
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        let estimate = run_cycle(&peer, &config, &*clock, &interrupt).unwrap();
        // No pause after the first sample; the pause after the second is cut short.
        assert_eq!(peer.requests(), 2);
        assert_eq!(estimate.stop, StopReason::Interrupted);
        assert_eq!(estimate.samples, 2);
        assert_eq!(estimate.average_offset_micros, 200_000);
    }

    #[test]
    fn no_pause_for_two_samples() {
        let clock = clock();
        let peer = ScriptedPeer::new(clock.clone(), &[ok(1), ok(1)]);
        let config = ConnectorConfig::builder()
            .host("scripted")
            .request_count(2)
            .request_interval(Duration::from_secs(3600))
            .build()
            .unwrap();
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        let estimate = run_cycle(&peer, &config, &*clock, &interrupt).unwrap();
        assert_eq!(estimate.stop, StopReason::Completed);
        // The pending signal was never consumed.
        assert!(interrupt.is_interrupted());
    }

    #[test]
    fn timeout_surfaces_as_recv_timeout() {
        let clock = clock();
        let peer = ScriptedPeer::new(clock.clone(), &[ok(1), Reply::Silence]);
        let result = run_cycle(&peer, &config(2), &*clock, &Interrupt::new());
        assert!(matches!(result, Err(NtpError::Timeout(TimeoutError::Recv))));
    }

    #[test]
    fn zero_requests_skip_the_network() {
        let clock = clock();
        let peer = ScriptedPeer::new(clock.clone(), &[]);
        let estimate = run_cycle(&peer, &config(0), &*clock, &Interrupt::new()).unwrap();
        assert_eq!(peer.requests(), 0);
        assert_eq!(estimate, Estimate::passthrough());
    }

    #[test]
    fn rejects_reply_from_an_old_request() {
        struct Replay;
        impl Datagram for Replay {
            fn send(&self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }
            fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
                let stale = Instant::new(1_600_000_000, 0).unwrap();
                let ts = TimestampFormat::try_from(stale).unwrap();
                let reply = Packet {
                    mode: Mode::Server,
                    version: Version::V4,
                    stratum: Stratum(1),
                    origin_timestamp: ts,
                    receive_timestamp: ts,
                    transmit_timestamp: ts,
                    ..Packet::default()
                };
                (&mut buf[..48]).write_bytes(reply)?;
                Ok(48)
            }
        }
        let clock = clock();
        let result = run_cycle(&Replay, &config(1), &*clock, &Interrupt::new());
        assert!(matches!(
            result,
            Err(NtpError::Protocol(ProtocolError::OriginTimestampMismatch { .. }))
        ));
    }
}
