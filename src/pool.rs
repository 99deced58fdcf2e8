//! The decoder worker pool (§4.4): one or more threads per family, each
//! consuming attribute blobs off the shared pipeline channel, decoding them
//! into [`crate::record::TelemetryRecord`]s, and forwarding a sampled subset
//! to its own owned [`Sink`].

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::warn;

use crate::config::Family;
use crate::reader::AttrBlob;
use crate::record::decode_socket;
use crate::serialize::encode_record;
use crate::sink::Sink;
use crate::stats::{send_with_backpressure, DecoderStats};

/// One decoder worker's run loop, executed on its own thread until the
/// pipeline channel disconnects (every reader for this cycle has exited and
/// dropped its sender).
///
/// `pipeline_rx` is shared by every worker in the family's pool; `std::sync
/// ::mpsc::Receiver` is not `Sync`, so workers take turns under a plain
/// mutex rather than each owning a private channel.
fn run_worker(
    family: Family,
    worker_id: usize,
    report_modulus: u64,
    stats_period: Duration,
    pipeline_rx: Arc<Mutex<Receiver<AttrBlob>>>,
    sink: Box<dyn Sink>,
    stats_tx: std::sync::mpsc::SyncSender<DecoderStats>,
) {
    let mut stats = DecoderStats {
        family: Some(family),
        worker_id,
        ..DecoderStats::default()
    };
    let modulus = report_modulus.max(1);
    let mut record_count: u64 = 0;
    let mut last_tick = Instant::now();

    loop {
        let blob = {
            let rx = pipeline_rx.lock().unwrap_or_else(|e| e.into_inner());
            rx.recv()
        };
        let blob = match blob {
            Ok(b) => b,
            Err(_) => break,
        };

        stats.messages_in += 1;
        stats.bytes_in += blob.body.len() as u64;

        let (record, pad_bytes) = match decode_socket(&blob.body, blob.captured_at) {
            Ok(v) => v,
            Err(e) => {
                warn!("decoder {worker_id} ({family:?}): decode error: {e}");
                continue;
            }
        };
        stats.bytes_read_total += blob.body.len() as u64;
        stats.pad_bytes_total += pad_bytes;

        record_count += 1;
        let keep = modulus == 1 || record_count % modulus == 1;
        if !keep {
            continue;
        }

        let encoded = match encode_record(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("decoder {worker_id} ({family:?}): serialize error: {e}");
                continue;
            }
        };

        match sink.send(&encoded) {
            Ok(()) => {
                stats.sends += 1;
                stats.bytes_sent += encoded.len() as u64;
            }
            Err(e) => {
                warn!("decoder {worker_id} ({family:?}): sink error: {e}");
                stats.send_errors += 1;
            }
        }

        if last_tick.elapsed() >= stats_period {
            last_tick = Instant::now();
            if send_with_backpressure(&stats_tx, stats).is_ok() {
                stats = DecoderStats {
                    family: Some(family),
                    worker_id,
                    ..DecoderStats::default()
                };
            }
        }
    }

    let _ = stats_tx.try_send(stats);
}

/// A running decoder pool for one family: a handle per worker thread plus
/// the `Arc` it shares with its siblings. Dropping the owning controller's
/// reference to the pipeline sender (not this struct) is what actually
/// triggers worker shutdown; `join` blocks until every worker has drained
/// and exited.
pub struct DecoderPool {
    handles: Vec<JoinHandle<()>>,
}

impl DecoderPool {
    /// Spawn `worker_count` decoder threads for `family`, each built from
    /// one entry of `sinks` (so callers can give each worker an
    /// independently-connected sink, e.g. separate UDP sockets).
    pub fn spawn(
        family: Family,
        pipeline_rx: Receiver<AttrBlob>,
        sinks: Vec<Box<dyn Sink>>,
        report_modulus: u64,
        stats_period: Duration,
        stats_tx: std::sync::mpsc::SyncSender<DecoderStats>,
    ) -> Self {
        let pipeline_rx = Arc::new(Mutex::new(pipeline_rx));
        let handles = sinks
            .into_iter()
            .enumerate()
            .map(|(worker_id, sink)| {
                let pipeline_rx = Arc::clone(&pipeline_rx);
                let stats_tx = stats_tx.clone();
                thread::Builder::new()
                    .name(format!("sockdiag-decoder-{family:?}-{worker_id}"))
                    .spawn(move || {
                        run_worker(
                            family,
                            worker_id,
                            report_modulus,
                            stats_period,
                            pipeline_rx,
                            sink,
                            stats_tx,
                        )
                    })
                    .expect("failed to spawn decoder worker thread")
            })
            .collect();

        DecoderPool { handles }
    }

    /// Block until every worker thread has exited.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sink::Sink as _;
    use std::sync::mpsc::sync_channel;
    use std::time::Duration as StdDuration;

    struct CountingSink {
        tx: std::sync::mpsc::Sender<Vec<u8>>,
    }

    impl Sink for CountingSink {
        fn send(&self, bytes: &[u8]) -> Result<(), crate::error::SinkError> {
            self.tx
                .send(bytes.to_vec())
                .map_err(|_| crate::error::SinkError::Serialize("receiver gone".into()))
        }
    }

    fn sample_body() -> Vec<u8> {
        let mut body = vec![libc::AF_INET as u8, 1, 0, 0];
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&[0u8; 16]);
        body.extend_from_slice(&[0u8; 16]);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body
    }

    #[test]
    fn worker_decodes_and_forwards_every_record_when_modulus_one() {
        let (pipeline_tx, pipeline_rx) = sync_channel::<AttrBlob>(8);
        let (delivered_tx, delivered_rx) = std::sync::mpsc::channel();
        let (stats_tx, stats_rx) = sync_channel(8);

        let pool = DecoderPool::spawn(
            Family::Inet,
            pipeline_rx,
            vec![Box::new(CountingSink { tx: delivered_tx })],
            1,
            StdDuration::from_millis(0),
            stats_tx,
        );

        pipeline_tx
            .send(AttrBlob {
                captured_at: StdDuration::from_secs(1),
                body: sample_body(),
            })
            .unwrap();
        drop(pipeline_tx);

        let delivered = delivered_rx.recv_timeout(StdDuration::from_secs(2)).unwrap();
        assert!(!delivered.is_empty());

        pool.join();
        assert!(stats_rx.try_recv().is_ok());
    }

    #[test]
    fn report_modulus_skips_non_matching_records() {
        let (pipeline_tx, pipeline_rx) = sync_channel::<AttrBlob>(8);
        let (delivered_tx, delivered_rx) = std::sync::mpsc::channel();
        let (stats_tx, _stats_rx) = sync_channel(8);

        let pool = DecoderPool::spawn(
            Family::Inet,
            pipeline_rx,
            vec![Box::new(CountingSink { tx: delivered_tx })],
            2,
            StdDuration::from_millis(0),
            stats_tx,
        );

        for _ in 0..4 {
            pipeline_tx
                .send(AttrBlob {
                    captured_at: StdDuration::from_secs(1),
                    body: sample_body(),
                })
                .unwrap();
        }
        drop(pipeline_tx);
        pool.join();

        let mut count = 0;
        while delivered_rx.try_recv().is_ok() {
            count += 1;
        }
        // modulus 2, keep on count % 2 == 1: records 1 and 3 of 4.
        assert_eq!(count, 2);
    }
}
