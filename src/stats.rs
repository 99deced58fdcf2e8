//! Statistics observer contract: typed, bounded channels that controllers,
//! readers, and decoders push periodic counters onto. Every sender honors
//! the same backpressure rule (§4.3/§4.4): try a non-blocking send first,
//! and only block — while counting the block — if the channel is full.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::time::{Duration, Instant};

use crate::config::Family;

/// One polling controller's cycle timing, emitted every cycle tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStats {
    pub family: Family,
    pub polling_loops: u64,
    pub poll_to_done: Duration,
    pub poll_duration: Duration,
    pub long_poll: bool,
}

/// One reader worker's lifetime totals, emitted once when the reader exits
/// (unlike decoder stats, these are not periodic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderStats {
    pub family: Option<Family>,
    pub reader_id: usize,
    pub packets_processed: u64,
    pub nasty_continue: u64,
    pub packet_buffer_in_size_total: u64,
    pub netlink_msg_count_total: u64,
    pub packet_buffer_bytes_read_total: u64,
    pub attr_blob_bytes_total: u64,
    pub netlink_msg_error_count: u64,
    pub out_blocked: u64,
    pub longest_blocked: Duration,
}

/// One decoder worker's counters since the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderStats {
    pub family: Option<Family>,
    pub worker_id: usize,
    pub messages_in: u64,
    pub bytes_in: u64,
    pub bytes_read_total: u64,
    pub pad_bytes_total: u64,
    pub sends: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
    pub stats_blocked: u64,
}

/// The three bounded statistics channels, constructed together so every
/// observer (controller, reader, decoder) gets matching depth.
pub struct StatsChannels {
    pub controller_tx: SyncSender<ControllerStats>,
    pub controller_rx: Receiver<ControllerStats>,
    pub reader_tx: SyncSender<ReaderStats>,
    pub reader_rx: Receiver<ReaderStats>,
    pub decoder_tx: SyncSender<DecoderStats>,
    pub decoder_rx: Receiver<DecoderStats>,
}

impl StatsChannels {
    pub fn new(depth: usize) -> Self {
        let (controller_tx, controller_rx) = sync_channel(depth.max(1));
        let (reader_tx, reader_rx) = sync_channel(depth.max(1));
        let (decoder_tx, decoder_rx) = sync_channel(depth.max(1));
        StatsChannels {
            controller_tx,
            controller_rx,
            reader_tx,
            reader_rx,
            decoder_tx,
            decoder_rx,
        }
    }
}

/// Send `msg` on `tx`, trying a non-blocking send first. If the channel is
/// full, the send blocks; returns whether the blocking path was taken and,
/// if so, how long the block lasted. Returns `Err` only if the receiving
/// end has been dropped (the observer is gone), matching the
/// channel-closed shutdown convention used throughout this crate.
pub fn send_with_backpressure<T>(
    tx: &SyncSender<T>,
    msg: T,
) -> Result<(bool, Duration), std::sync::mpsc::SendError<T>> {
    match tx.try_send(msg) {
        Ok(()) => Ok((false, Duration::ZERO)),
        Err(TrySendError::Full(msg)) => {
            let start = Instant::now();
            tx.send(msg)?;
            Ok((true, start.elapsed()))
        }
        Err(TrySendError::Disconnected(msg)) => Err(std::sync::mpsc::SendError(msg)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::sync_channel;

    #[test]
    fn non_blocking_path_when_channel_has_room() {
        let (tx, rx) = sync_channel(1);
        let (blocked, dur) = send_with_backpressure(&tx, 1u32).unwrap();
        assert!(!blocked);
        assert_eq!(dur, Duration::ZERO);
        assert_eq!(rx.recv().unwrap(), 1);
    }

    #[test]
    fn blocking_path_when_channel_is_full() {
        let (tx, rx) = sync_channel(1);
        tx.try_send(0u32).unwrap();

        let tx2 = tx.clone();
        let handle = std::thread::spawn(move || send_with_backpressure(&tx2, 1u32));

        // give the spawned thread a chance to observe the full channel
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.recv().unwrap(), 0);

        let (blocked, _dur) = handle.join().unwrap().unwrap();
        assert!(blocked);
        assert_eq!(rx.recv().unwrap(), 1);
    }

    #[test]
    fn disconnected_receiver_surfaces_as_error() {
        let (tx, rx) = sync_channel::<u32>(1);
        drop(rx);
        assert!(send_with_backpressure(&tx, 1).is_err());
    }
}
