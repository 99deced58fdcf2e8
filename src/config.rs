//! Immutable collector configuration.
//!
//! The original source passes a struct of pointers through every
//! collaborator so they can mutate shared fields in place. This crate
//! replaces that with a plain value-type record built once through
//! [`ConfigBuilder`] and then shared behind an `Arc` — no field is mutated
//! after construction.

use std::time::Duration;

use derive_builder::Builder;
use getset::Getters;

use crate::consts::socket::AddrFamily;

/// Default receive buffer multiplier (page-size units) when unset.
pub const DEFAULT_RECV_BUFFER_MULTIPLIER: usize = 8;

/// Extension bitmask requesting every attribute this crate recognizes.
pub const IDIAG_EXT_ALL: u8 = 0xFF;

/// One address family the collector polls. Mirrors [`AddrFamily`] but
/// restricted to the two values `sock_diag` dumps support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// IPv4 (`AF_INET`, `inet_diag_msg.family == 2`).
    Inet,
    /// IPv6 (`AF_INET6`, `inet_diag_msg.family == 10`).
    Inet6,
}

impl Family {
    /// The raw `inet_diag_msg.family` / `AF_*` value.
    pub fn raw(self) -> u8 {
        match self {
            Family::Inet => libc::AF_INET as u8,
            Family::Inet6 => libc::AF_INET6 as u8,
        }
    }

    /// Number of address bytes a socket record carries for this family.
    pub fn addr_len(self) -> usize {
        match self {
            Family::Inet => 4,
            Family::Inet6 => 16,
        }
    }
}

impl From<Family> for AddrFamily {
    fn from(f: Family) -> Self {
        match f {
            Family::Inet => AddrFamily::Inet,
            Family::Inet6 => AddrFamily::Inet6,
        }
    }
}

/// Collector configuration, assembled once at startup and shared by
/// reference with every controller, reader, and decoder worker.
#[derive(Debug, Clone, Getters, Builder)]
#[builder(pattern = "owned", setter(into), build_fn(validate = "ConfigBuilder::validate"))]
#[getset(get = "pub")]
pub struct Config {
    /// Address families to poll. Each spawns its own controller.
    #[builder(default = "vec![Family::Inet, Family::Inet6]")]
    families: Vec<Family>,

    /// Interval between the start of one cycle and the next.
    #[builder(default = "Duration::from_secs(10)")]
    polling_period: Duration,

    /// Fraction of `polling_period` above which a cycle is flagged as long.
    #[builder(default = "0.8")]
    polling_safety_buffer: f64,

    /// `SO_RCVTIMEO` in milliseconds; 0 disables the timeout.
    #[builder(default = "1000")]
    recv_timeout_millis: u64,

    /// Number of cycles to run; 0 means unbounded. The controller actually
    /// executes `max_loops + 1` cycles, matching the ported system's
    /// off-by-one loop bound (see DESIGN.md).
    #[builder(default = "0")]
    max_loops: u64,

    /// Reader threads spawned per family per cycle.
    #[builder(default = "1")]
    readers_per_family: usize,

    /// Decoder threads spawned per family.
    #[builder(default = "4")]
    decoders_per_family: usize,

    /// Bound on the reader-to-decoder pipeline channel.
    #[builder(default = "1024")]
    pipeline_channel_depth: usize,

    /// Bound on each statistics-observer channel.
    #[builder(default = "16")]
    stats_channel_depth: usize,

    /// Explicit receive buffer size in bytes; 0 selects
    /// `page_size * recv_buffer_multiplier`.
    #[builder(default = "0")]
    recv_buffer_size: usize,

    /// Multiplier applied to the page size when `recv_buffer_size == 0`.
    #[builder(default = "DEFAULT_RECV_BUFFER_MULTIPLIER")]
    recv_buffer_multiplier: usize,

    /// Reader-side keep-every-Nth-message modulus. `1` keeps everything.
    #[builder(default = "1")]
    sampling_modulus: u64,

    /// Decoder-side emit-every-Nth-record modulus. `1` emits everything.
    #[builder(default = "1")]
    report_modulus: u64,

    /// Stats ticker period as a fraction of `polling_period`.
    #[builder(default = "0.5")]
    stats_ratio: f64,

    /// Initial netlink sequence number; incremented by cycle index.
    #[builder(default = "1")]
    base_sequence: u32,

    /// Requested `inet_diag_req_v2.idiag_ext` bitmask. `0` is normalized to
    /// [`IDIAG_EXT_ALL`].
    #[builder(default = "IDIAG_EXT_ALL")]
    idiag_ext: u8,

    /// Tear the decoder pool down and rebuild it at the end of every cycle,
    /// rather than keeping it alive across cycles.
    #[builder(default = "false")]
    recycle_workers_each_cycle: bool,
}

impl Config {
    /// Start building a [`Config`] with every field at its documented
    /// default.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The effective receive buffer size in bytes.
    pub fn effective_recv_buffer_size(&self) -> usize {
        if self.recv_buffer_size > 0 {
            self.recv_buffer_size
        } else {
            crate::utils::page_size() * self.recv_buffer_multiplier.max(1)
        }
    }

    /// The effective `idiag_ext` bitmask, normalizing `0` to "request all".
    pub fn effective_idiag_ext(&self) -> u8 {
        if self.idiag_ext == 0 {
            IDIAG_EXT_ALL
        } else {
            self.idiag_ext
        }
    }
}

impl ConfigBuilder {
    /// Validate cross-field invariants not expressible as a single
    /// `#[builder(default)]`.
    fn validate(&self) -> Result<(), String> {
        if let Some(p) = &self.polling_safety_buffer {
            if !(*p > 0.0 && *p < 1.0) {
                return Err("polling_safety_buffer must be in (0, 1)".to_string());
            }
        }
        if let Some(readers) = &self.readers_per_family {
            if *readers == 0 {
                return Err("readers_per_family must be >= 1".to_string());
            }
        }
        if let Some(decoders) = &self.decoders_per_family {
            if *decoders == 0 {
                return Err("decoders_per_family must be >= 1".to_string());
            }
        }
        if let Some(depth) = &self.pipeline_channel_depth {
            if *depth == 0 {
                return Err("pipeline_channel_depth must be >= 1".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_build() {
        let cfg = Config::builder().build().expect("default config is valid");
        assert_eq!(cfg.families(), &[Family::Inet, Family::Inet6]);
        assert_eq!(*cfg.sampling_modulus(), 1);
        assert_eq!(cfg.effective_idiag_ext(), IDIAG_EXT_ALL);
    }

    #[test]
    fn zero_buffer_size_falls_back_to_page_size() {
        let cfg = Config::builder().build().unwrap();
        assert!(cfg.effective_recv_buffer_size() >= 4096 * DEFAULT_RECV_BUFFER_MULTIPLIER);
    }

    #[test]
    fn family_addr_len_matches_wire_width() {
        assert_eq!(Family::Inet.addr_len(), 4);
        assert_eq!(Family::Inet6.addr_len(), 16);
        assert_eq!(Family::Inet.raw(), 2);
        assert_eq!(Family::Inet6.raw(), 10);
    }
}
