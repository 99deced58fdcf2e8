//! The polling controller (§4.5): one per family, owning the dump-request
//! cadence, the reader fan-out, and the decoder pool's lifetime.

use std::sync::mpsc::sync_channel;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::warn;

use crate::config::{Config, Family};
use crate::error::SetupError;
use crate::pool::DecoderPool;
use crate::reader::run_reader;
use crate::sink::Sink;
use crate::socket::NetlinkSocket;
use crate::stats::{send_with_backpressure, ControllerStats, StatsChannels};
use crate::wire::{build_dump_request, rewrite_sequence};

/// Run one family's controller to completion (or forever, if
/// `config.max_loops() == 0`).
///
/// `make_sink` builds one sink per decoder worker; it is called
/// `config.decoders_per_family()` times up front (or once per cycle, if
/// `config.recycle_workers_each_cycle()` is set).
pub fn run_family_controller(
    family: Family,
    config: &Config,
    stats: &StatsChannels,
    make_sink: impl Fn(usize) -> Box<dyn Sink>,
) -> Result<(), SetupError> {
    let socket = Arc::new(NetlinkSocket::open(*config.recv_timeout_millis())?);

    // IPv6 starts halfway into the period so its dumps don't contend with
    // IPv4's on the same tick.
    if family == Family::Inet6 {
        thread::sleep(*config.polling_period() / 2);
    }

    let mut dump_request = build_dump_request(family, *config.base_sequence(), config.effective_idiag_ext());

    let mut pool = if *config.recycle_workers_each_cycle() {
        None
    } else {
        Some(spawn_pool(family, config, stats, &make_sink))
    };

    let mut cycle_index: u64 = 0;
    loop {
        let cycle_start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let cycle_began = Instant::now();

        let sequence = config.base_sequence().wrapping_add(cycle_index as u32);
        rewrite_sequence(&mut dump_request, sequence);

        if let Err(e) = socket.send(&dump_request) {
            warn!("controller ({family:?}): failed to send dump request: {e}");
        }

        let active_pool = match &pool {
            Some(p) => p,
            None => {
                pool = Some(spawn_pool(family, config, stats, &make_sink));
                pool.as_ref().unwrap()
            }
        };

        let (done_tx, done_rx) = sync_channel::<Instant>(1);
        let readers = config.readers_per_family().max(1);
        let done_at = Instant::now();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..readers)
                .map(|reader_id| {
                    let socket = Arc::clone(&socket);
                    let done_tx = done_tx.clone();
                    let pipeline_tx = active_pool.pipeline_tx.clone();
                    scope.spawn(move || {
                        run_reader(
                            family,
                            reader_id,
                            config,
                            &socket,
                            cycle_start,
                            &pipeline_tx,
                            &done_tx,
                        )
                    })
                })
                .collect();
            drop(done_tx);

            for handle in handles {
                let reader_stats = handle.join().unwrap_or_default();
                let _ = send_with_backpressure(&stats.reader_tx, reader_stats);
            }
        });

        let poll_to_done = done_rx
            .try_recv()
            .map(|instant| instant.saturating_duration_since(done_at))
            .unwrap_or(cycle_began.elapsed());
        let poll_duration = cycle_began.elapsed();
        let long_poll = poll_duration.as_secs_f64()
            > config.polling_period().as_secs_f64() * config.polling_safety_buffer();

        if *config.recycle_workers_each_cycle() {
            if let Some(p) = pool.take() {
                drop(p.pipeline_tx);
                p.inner.join();
            }
        }

        let controller_stats = ControllerStats {
            family,
            polling_loops: cycle_index,
            poll_to_done,
            poll_duration,
            long_poll,
        };
        let _ = send_with_backpressure(&stats.controller_tx, controller_stats);

        if *config.max_loops() != 0 && cycle_index >= *config.max_loops() {
            break;
        }
        cycle_index += 1;

        let elapsed = cycle_began.elapsed();
        if elapsed < *config.polling_period() {
            thread::sleep(*config.polling_period() - elapsed);
        }
    }

    if let Some(p) = pool.take() {
        drop(p.pipeline_tx);
        p.inner.join();
    }

    Ok(())
}

/// A decoder pool together with the sending half of the channel feeding it,
/// bundled so the controller can drop the sender (signalling shutdown) and
/// then join the pool without juggling two separate lifetimes.
struct RunningPool {
    pipeline_tx: std::sync::mpsc::SyncSender<crate::reader::AttrBlob>,
    inner: DecoderPool,
}

fn spawn_pool(
    family: Family,
    config: &Config,
    stats: &StatsChannels,
    make_sink: &impl Fn(usize) -> Box<dyn Sink>,
) -> RunningPool {
    let (pipeline_tx, pipeline_rx) = sync_channel(*config.pipeline_channel_depth());
    let sinks = (0..config.decoders_per_family().max(1))
        .map(|i| make_sink(i))
        .collect();
    let stats_period = config.polling_period().mul_f64(*config.stats_ratio());
    let inner = DecoderPool::spawn(
        family,
        pipeline_rx,
        sinks,
        *config.report_modulus(),
        stats_period,
        stats.decoder_tx.clone(),
    );
    RunningPool { pipeline_tx, inner }
}
