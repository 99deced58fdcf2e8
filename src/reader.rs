//! The netlink reader: one thread per reader-per-family, draining the
//! `sock_diag` dump response and forwarding each socket's attribute body
//! to the decoder pool.

use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;

use crate::config::{Config, Family};
use crate::consts::alignto;
use crate::consts::nl::NlmsgType;
use crate::error::CycleError;
use crate::socket::NetlinkSocket;
use crate::stats::{send_with_backpressure, ReaderStats};
use crate::wire::{classify, MessageClass, NlHeader, NLMSG_HDRLEN};

/// One socket's attribute body, tagged with the cycle's send timestamp.
pub struct AttrBlob {
    /// The cycle's send time (duration since `UNIX_EPOCH`), stamped onto
    /// every record decoded from this blob — not the decoder's own clock.
    pub captured_at: Duration,
    /// `inet_diag_msg` plus its TLV attribute stream, copied out of the
    /// reader's scratch buffer.
    pub body: Vec<u8>,
}

/// Run one reader to completion: drain datagrams until the receive
/// timeout fires, forwarding sampled data messages to `pipeline_tx` and
/// reporting the first-seen `DONE` on `done_tx`. Returns the reader's
/// lifetime statistics, which the caller is responsible for publishing.
pub fn run_reader(
    family: Family,
    reader_id: usize,
    config: &Config,
    socket: &NetlinkSocket,
    cycle_start: Duration,
    pipeline_tx: &SyncSender<AttrBlob>,
    done_tx: &SyncSender<Instant>,
) -> ReaderStats {
    let mut stats = ReaderStats {
        family: Some(family),
        reader_id,
        ..ReaderStats::default()
    };

    let mut buffer = vec![0u8; config.effective_recv_buffer_size()];
    let modulus = (*config.sampling_modulus()).max(1);
    let mut msg_count: u64 = 0;

    loop {
        let n = match socket.recv(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(e) => {
                let err = CycleError::Recv(e);
                warn!("reader {reader_id} ({family:?}): {err}");
                stats.nasty_continue += 1;
                continue;
            }
        };
        stats.packets_processed += 1;
        stats.packet_buffer_in_size_total += n as u64;

        if n < NLMSG_HDRLEN {
            let err = CycleError::TruncatedDatagram { len: n };
            warn!("reader {reader_id} ({family:?}): {err}");
            stats.nasty_continue += 1;
            continue;
        }

        let mut offset = 0usize;
        while offset + NLMSG_HDRLEN <= n {
            let header = match NlHeader::parse(&buffer[offset..n]) {
                Ok(h) => h,
                Err(_) => break,
            };
            if (header.length as usize) < NLMSG_HDRLEN || offset + header.length as usize > n {
                stats.netlink_msg_error_count += 1;
                break;
            }
            stats.netlink_msg_count_total += 1;

            match classify(&header) {
                MessageClass::Done => {
                    // Best effort: only the first reader to see DONE gets
                    // through a single-slot channel; later attempts on an
                    // already-full slot are not an error.
                    let _ = done_tx.try_send(Instant::now());
                    break;
                }
                MessageClass::Error => {
                    let err = match header.message_type() {
                        NlmsgType::Noop | NlmsgType::Error | NlmsgType::Overrun => {
                            CycleError::SentinelError {
                                nlmsg_type: header.nlmsg_type,
                            }
                        }
                        _ => CycleError::UnexpectedFlags {
                            flags: header.flags,
                        },
                    };
                    warn!("reader {reader_id} ({family:?}): {err}");
                    stats.netlink_msg_error_count += 1;
                    break;
                }
                MessageClass::Data => {
                    let body_len = header.length as usize - NLMSG_HDRLEN;
                    stats.packet_buffer_bytes_read_total += body_len as u64;

                    msg_count += 1;
                    let keep = modulus == 1 || msg_count % modulus == 1;
                    if keep {
                        let body_start = offset + NLMSG_HDRLEN;
                        let body = buffer[body_start..body_start + body_len].to_vec();
                        stats.attr_blob_bytes_total += body.len() as u64;

                        match send_with_backpressure(
                            pipeline_tx,
                            AttrBlob {
                                captured_at: cycle_start,
                                body,
                            },
                        ) {
                            Ok((blocked, dur)) => {
                                if blocked {
                                    stats.out_blocked += 1;
                                    stats.longest_blocked = stats.longest_blocked.max(dur);
                                }
                            }
                            Err(_) => break, // decoder pool gone; cycle is tearing down
                        }
                    }
                }
            }

            offset += alignto(header.length as usize);
        }
    }

    stats
}
