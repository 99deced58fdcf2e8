//! Per-socket data model: the fixed `inet_diag_msg`/`tcp_info`/`meminfo`/
//! `bbrinfo` kernel structs, the attribute TLV decoder that populates them,
//! and the [`TelemetryRecord`] assembled from the result.
//!
//! Every struct here is plain wire data with no invariants to protect, so
//! fields are public directly rather than wrapped in generated accessors
//! (accessors are reserved for structs that encapsulate behavior, like
//! [`crate::config::Config`] and the stats snapshots).

use std::io::{Cursor, Read};
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::DecodeError;
use crate::utils::{align4_pad, swap16};
use crate::wire::{AttrHeader, NLA_HDRLEN};

/// Size of the fixed `inet_diag_msg` prefix of a data message body.
pub const INET_DIAG_MSG_LEN: usize = 72;
/// Size of the v4.15 `tcp_info` layout this crate knows how to parse.
pub const TCP_INFO_LEN: usize = 192;
/// Size of `struct inet_diag_meminfo` / the `SKMEMINFO` attribute payload.
pub const SK_MEMINFO_LEN: usize = 36;
/// Size of `struct tcp_bbr_info`.
pub const BBR_INFO_LEN: usize = 20;

/// Attribute kinds recognized in the `sock_diag` TLV stream. Kinds outside
/// this set are skipped by advancing over their padded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    MemInfo,
    Info,
    Cong,
    Tos,
    TClass,
    SkMemInfo,
    Shutdown,
    Mark,
    BbrInfo,
    ClassId,
    Unrecognized(u16),
}

impl From<u16> for AttributeKind {
    fn from(v: u16) -> Self {
        match v {
            1 => AttributeKind::MemInfo,
            2 => AttributeKind::Info,
            4 => AttributeKind::Cong,
            5 => AttributeKind::Tos,
            6 => AttributeKind::TClass,
            7 => AttributeKind::SkMemInfo,
            8 => AttributeKind::Shutdown,
            15 => AttributeKind::Mark,
            16 => AttributeKind::BbrInfo,
            17 => AttributeKind::ClassId,
            other => AttributeKind::Unrecognized(other),
        }
    }
}

/// Congestion control algorithm, derived from the first three bytes of the
/// `CONG` attribute's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CongestionAlgorithm {
    #[default]
    Unknown,
    Cubic,
    Bbr1,
    Bbr2,
}

impl CongestionAlgorithm {
    fn from_name_prefix(prefix: &[u8]) -> Self {
        match prefix {
            [b'c', b'u', b'b'] => CongestionAlgorithm::Cubic,
            [b'b', b'b', b'r'] => CongestionAlgorithm::Bbr1,
            _ => CongestionAlgorithm::Unknown,
        }
    }
}

/// A socket's source/destination identity as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocketId {
    /// Host-order source port (byte-swapped from the wire's network order).
    pub source_port: u16,
    /// Host-order destination port.
    pub destination_port: u16,
    /// Source address, sliced to the family's width (4 or 16 bytes).
    pub source: [u8; 16],
    /// Destination address, sliced to the family's width.
    pub destination: [u8; 16],
    /// Interface index.
    pub interface: u32,
    /// Socket cookie, reassembled from two little-endian `u32` words.
    pub cookie: u64,
}

/// The fixed `inet_diag_msg` socket summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InetDiagMsg {
    pub family: u8,
    pub state: u8,
    pub timer: u8,
    pub retrans: u8,
    pub id: SocketId,
    pub expires: u32,
    pub rqueue: u32,
    pub wqueue: u32,
    pub uid: u32,
    pub inode: u32,
}

impl InetDiagMsg {
    /// Number of address bytes meaningful for this message's family (4 for
    /// IPv4, 16 for IPv6; 0 if the family is neither).
    pub fn addr_len(&self) -> usize {
        match self.family as i32 {
            libc::AF_INET => 4,
            libc::AF_INET6 => 16,
            _ => 0,
        }
    }

    fn parse(r: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        let family = r.read_u8()?;
        let state = r.read_u8()?;
        let timer = r.read_u8()?;
        let retrans = r.read_u8()?;

        let source_port = swap16(r.read_u16::<LittleEndian>()?);
        let destination_port = swap16(r.read_u16::<LittleEndian>()?);
        let mut source = [0u8; 16];
        r.read_exact(&mut source)?;
        let mut destination = [0u8; 16];
        r.read_exact(&mut destination)?;
        let interface = r.read_u32::<LittleEndian>()?;
        let cookie_lo = r.read_u32::<LittleEndian>()? as u64;
        let cookie_hi = r.read_u32::<LittleEndian>()? as u64;
        let cookie = cookie_lo | (cookie_hi << 32);

        let expires = r.read_u32::<LittleEndian>()?;
        let rqueue = r.read_u32::<LittleEndian>()?;
        let wqueue = r.read_u32::<LittleEndian>()?;
        let uid = r.read_u32::<LittleEndian>()?;
        let inode = r.read_u32::<LittleEndian>()?;

        Ok(InetDiagMsg {
            family,
            state,
            timer,
            retrans,
            id: SocketId {
                source_port,
                destination_port,
                source,
                destination,
                interface,
                cookie,
            },
            expires,
            rqueue,
            wqueue,
            uid,
            inode,
        })
    }
}

/// The kernel's `tcp_info` block, v4.15 layout (through `sndbuf_limited`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpInfo {
    pub state: u8,
    pub ca_state: u8,
    pub retransmits: u8,
    pub probes: u8,
    pub backoff: u8,
    pub options: u8,
    /// Unpacked from the 7th byte: high nibble.
    pub snd_wscale: u8,
    /// Unpacked from the 7th byte: low nibble.
    pub rcv_wscale: u8,
    /// Unpacked from the 8th byte: bit 0.
    pub delivery_rate_app_limited: bool,
    /// Unpacked from the 8th byte: bits 1-2.
    pub fastopen_client_fail: u8,
    pub rto: u32,
    pub ato: u32,
    pub snd_mss: u32,
    pub rcv_mss: u32,
    pub unacked: u32,
    pub sacked: u32,
    pub lost: u32,
    pub retrans: u32,
    pub fackets: u32,
    pub last_data_sent: u32,
    pub last_ack_sent: u32,
    pub last_data_recv: u32,
    pub last_ack_recv: u32,
    pub pmtu: u32,
    pub rcv_ssthresh: u32,
    pub rtt: u32,
    pub rttvar: u32,
    pub snd_ssthresh: u32,
    pub snd_cwnd: u32,
    pub advmss: u32,
    pub reordering: u32,
    pub rcv_rtt: u32,
    pub rcv_space: u32,
    pub total_retrans: u32,
    pub pacing_rate: u64,
    pub max_pacing_rate: u64,
    pub bytes_acked: u64,
    pub bytes_received: u64,
    pub segs_out: u32,
    pub segs_in: u32,
    pub notsent_bytes: u32,
    pub min_rtt: u32,
    pub data_segs_in: u32,
    pub data_segs_out: u32,
    pub delivery_rate: u64,
    pub busy_time: u64,
    pub rwnd_limited: u64,
    pub sndbuf_limited: u64,
}

/// Parse as much of a `tcp_info` block as `buf` contains, leaving any
/// fields beyond the available bytes at their zero default (the "safety
/// clamp" for older kernels that report a shorter struct).
fn parse_tcp_info(buf: &[u8]) -> std::io::Result<TcpInfo> {
    let mut info = TcpInfo::default();
    let mut r = Cursor::new(buf);

    macro_rules! try_read {
        ($read:expr, $field:expr) => {
            match $read {
                Ok(v) => $field = v,
                Err(_) => return Ok(info),
            }
        };
    }

    try_read!(r.read_u8(), info.state);
    try_read!(r.read_u8(), info.ca_state);
    try_read!(r.read_u8(), info.retransmits);
    try_read!(r.read_u8(), info.probes);
    try_read!(r.read_u8(), info.backoff);
    try_read!(r.read_u8(), info.options);

    let scale_byte = match r.read_u8() {
        Ok(v) => v,
        Err(_) => return Ok(info),
    };
    info.snd_wscale = (scale_byte >> 4) & 0x0F;
    info.rcv_wscale = scale_byte & 0x0F;

    let flags_byte = match r.read_u8() {
        Ok(v) => v,
        Err(_) => return Ok(info),
    };
    info.delivery_rate_app_limited = flags_byte & 0x1 != 0;
    info.fastopen_client_fail = (flags_byte >> 1) & 0x3;

    try_read!(r.read_u32::<LittleEndian>(), info.rto);
    try_read!(r.read_u32::<LittleEndian>(), info.ato);
    try_read!(r.read_u32::<LittleEndian>(), info.snd_mss);
    try_read!(r.read_u32::<LittleEndian>(), info.rcv_mss);
    try_read!(r.read_u32::<LittleEndian>(), info.unacked);
    try_read!(r.read_u32::<LittleEndian>(), info.sacked);
    try_read!(r.read_u32::<LittleEndian>(), info.lost);
    try_read!(r.read_u32::<LittleEndian>(), info.retrans);
    try_read!(r.read_u32::<LittleEndian>(), info.fackets);
    try_read!(r.read_u32::<LittleEndian>(), info.last_data_sent);
    try_read!(r.read_u32::<LittleEndian>(), info.last_ack_sent);
    try_read!(r.read_u32::<LittleEndian>(), info.last_data_recv);
    try_read!(r.read_u32::<LittleEndian>(), info.last_ack_recv);
    try_read!(r.read_u32::<LittleEndian>(), info.pmtu);
    try_read!(r.read_u32::<LittleEndian>(), info.rcv_ssthresh);
    try_read!(r.read_u32::<LittleEndian>(), info.rtt);
    try_read!(r.read_u32::<LittleEndian>(), info.rttvar);
    try_read!(r.read_u32::<LittleEndian>(), info.snd_ssthresh);
    try_read!(r.read_u32::<LittleEndian>(), info.snd_cwnd);
    try_read!(r.read_u32::<LittleEndian>(), info.advmss);
    try_read!(r.read_u32::<LittleEndian>(), info.reordering);
    try_read!(r.read_u32::<LittleEndian>(), info.rcv_rtt);
    try_read!(r.read_u32::<LittleEndian>(), info.rcv_space);
    try_read!(r.read_u32::<LittleEndian>(), info.total_retrans);
    try_read!(r.read_u64::<LittleEndian>(), info.pacing_rate);
    try_read!(r.read_u64::<LittleEndian>(), info.max_pacing_rate);
    try_read!(r.read_u64::<LittleEndian>(), info.bytes_acked);
    try_read!(r.read_u64::<LittleEndian>(), info.bytes_received);
    try_read!(r.read_u32::<LittleEndian>(), info.segs_out);
    try_read!(r.read_u32::<LittleEndian>(), info.segs_in);
    try_read!(r.read_u32::<LittleEndian>(), info.notsent_bytes);
    try_read!(r.read_u32::<LittleEndian>(), info.min_rtt);
    try_read!(r.read_u32::<LittleEndian>(), info.data_segs_in);
    try_read!(r.read_u32::<LittleEndian>(), info.data_segs_out);
    try_read!(r.read_u64::<LittleEndian>(), info.delivery_rate);
    try_read!(r.read_u64::<LittleEndian>(), info.busy_time);
    try_read!(r.read_u64::<LittleEndian>(), info.rwnd_limited);
    try_read!(r.read_u64::<LittleEndian>(), info.sndbuf_limited);

    Ok(info)
}

/// `struct inet_diag_meminfo` (the `SKMEMINFO` attribute payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkMemInfo {
    pub rmem_alloc: u32,
    pub rcvbuf: u32,
    pub wmem_alloc: u32,
    pub sndbuf: u32,
    pub fwd_alloc: u32,
    pub wmem_queued: u32,
    pub optmem: u32,
    pub backlog: u32,
    pub drops: u32,
}

fn parse_sk_meminfo(buf: &[u8]) -> std::io::Result<SkMemInfo> {
    let mut m = SkMemInfo::default();
    let mut r = Cursor::new(buf);
    macro_rules! try_read {
        ($field:expr) => {
            match r.read_u32::<LittleEndian>() {
                Ok(v) => $field = v,
                Err(_) => return Ok(m),
            }
        };
    }
    try_read!(m.rmem_alloc);
    try_read!(m.rcvbuf);
    try_read!(m.wmem_alloc);
    try_read!(m.sndbuf);
    try_read!(m.fwd_alloc);
    try_read!(m.wmem_queued);
    try_read!(m.optmem);
    try_read!(m.backlog);
    try_read!(m.drops);
    Ok(m)
}

/// `struct tcp_bbr_info` (the `BBRINFO` attribute payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BbrInfo {
    pub bw_lo: u32,
    pub bw_hi: u32,
    pub min_rtt_us: u32,
    pub pacing_gain: u32,
    pub cwnd_gain: u32,
}

fn parse_bbr_info(buf: &[u8]) -> std::io::Result<BbrInfo> {
    let mut b = BbrInfo::default();
    let mut r = Cursor::new(buf);
    macro_rules! try_read {
        ($field:expr) => {
            match r.read_u32::<LittleEndian>() {
                Ok(v) => $field = v,
                Err(_) => return Ok(b),
            }
        };
    }
    try_read!(b.bw_lo);
    try_read!(b.bw_hi);
    try_read!(b.min_rtt_us);
    try_read!(b.pacing_gain);
    try_read!(b.cwnd_gain);
    Ok(b)
}

/// A fully decoded per-socket telemetry record, ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Wall-clock time this socket was captured, taken from the cycle's
    /// start timestamp (not the decoder worker's own clock).
    pub captured_at: Duration,
    pub summary: InetDiagMsg,
    pub tcp_info: TcpInfo,
    pub mem_info: SkMemInfo,
    pub congestion: CongestionAlgorithm,
    /// Present only when the `TOS` attribute was non-zero.
    pub tos: Option<u8>,
    /// Present only when the `TCLASS` attribute was non-zero.
    pub tclass: Option<u8>,
    /// Present only when the `SHUTDOWN` attribute was non-zero.
    pub shutdown_state: Option<u8>,
    /// Present only when the `MARK` attribute was non-zero.
    pub class_id: Option<u32>,
    /// Present iff `congestion` is `Bbr1`/`Bbr2`.
    pub bbr_info: Option<BbrInfo>,
}

/// Decode one socket's message body (the `inet_diag_msg` prefix followed by
/// its TLV attribute stream) into a [`TelemetryRecord`].
///
/// `captured_at` stamps the record; it should be the cycle's send time, not
/// the time this function runs. Returns `Err` only if the body is too short
/// to even contain the fixed `inet_diag_msg` prefix; individual malformed
/// attributes are skipped rather than failing the whole decode, per the
/// "skip this TLV, continue" policy.
///
/// On success, also returns the total number of padding bytes (forward-pad
/// plus alignment-pad) skipped while walking the attribute stream, for the
/// decoder's stats snapshot.
pub fn decode_socket(
    body: &[u8],
    captured_at: Duration,
) -> Result<(TelemetryRecord, u64), DecodeError> {
    if body.len() < INET_DIAG_MSG_LEN {
        return Err(DecodeError::UnexpectedEof);
    }

    let mut cursor = Cursor::new(body);
    let summary =
        InetDiagMsg::parse(&mut cursor).map_err(|_| DecodeError::UnexpectedEof)?;

    let mut record = TelemetryRecord {
        captured_at,
        summary,
        tcp_info: TcpInfo::default(),
        mem_info: SkMemInfo::default(),
        congestion: CongestionAlgorithm::Unknown,
        tos: None,
        tclass: None,
        shutdown_state: None,
        class_id: None,
        bbr_info: None,
    };

    let pad_bytes = decode_attributes(body, &mut cursor, &mut record);
    Ok((record, pad_bytes))
}

/// Walk the TLV attribute stream following the `inet_diag_msg` prefix,
/// populating `record` with whatever recognized attributes are present.
/// Returns the total padding bytes skipped.
fn decode_attributes(body: &[u8], cursor: &mut Cursor<&[u8]>, record: &mut TelemetryRecord) -> u64 {
    let mut pad_bytes: u64 = 0;
    loop {
        let offset = cursor.position() as usize;
        if offset + NLA_HDRLEN > body.len() {
            break;
        }

        let header = match AttrHeader::parse(cursor) {
            Ok(h) => h,
            Err(_) => break,
        };
        if header.nla_len == 0 {
            break;
        }
        if (header.nla_len as usize) < NLA_HDRLEN {
            break;
        }

        let payload_len = header.payload_len();
        let payload_start = offset + NLA_HDRLEN;
        let payload_end = (payload_start + payload_len).min(body.len());
        let payload = &body[payload_start..payload_end];

        apply_attribute(AttributeKind::from(header.nla_type), payload, record);

        // Forward-padding absorbs any declared length beyond what we could
        // slice from the buffer (kernel-version growth); alignment padding
        // rounds the whole attribute up to a 4-byte boundary.
        let consumed_payload = payload.len();
        let forward_pad = payload_len.saturating_sub(consumed_payload);
        let align_pad = align4_pad(header.nla_len as usize);
        pad_bytes += (forward_pad + align_pad) as u64;
        let next = payload_start + consumed_payload + forward_pad + align_pad;

        if next <= offset {
            break;
        }
        cursor.set_position(next.min(body.len()) as u64);

        if cursor.position() as usize >= body.len() {
            break;
        }
    }
    pad_bytes
}

fn apply_attribute(kind: AttributeKind, payload: &[u8], record: &mut TelemetryRecord) {
    match kind {
        AttributeKind::Info => {
            if let Ok(info) = parse_tcp_info(payload) {
                record.tcp_info = info;
            }
        }
        AttributeKind::Cong => {
            if payload.len() >= 3 {
                record.congestion = CongestionAlgorithm::from_name_prefix(&payload[..3]);
            }
        }
        AttributeKind::SkMemInfo => {
            if let Ok(mem) = parse_sk_meminfo(payload) {
                record.mem_info = mem;
            }
        }
        AttributeKind::BbrInfo => {
            if let Ok(bbr) = parse_bbr_info(payload) {
                record.bbr_info = Some(bbr);
            }
        }
        AttributeKind::Tos => {
            if let Some(&v) = payload.first() {
                if v != 0 {
                    record.tos = Some(v);
                }
            }
        }
        AttributeKind::TClass => {
            if let Some(&v) = payload.first() {
                if v != 0 {
                    record.tclass = Some(v);
                }
            }
        }
        AttributeKind::Shutdown => {
            if let Some(&v) = payload.first() {
                if v != 0 {
                    record.shutdown_state = Some(v);
                }
            }
        }
        AttributeKind::ClassId => {
            if payload.len() >= 4 {
                let v = u32::from_le_bytes(payload[..4].try_into().unwrap());
                if v != 0 {
                    record.class_id = Some(v);
                }
            }
        }
        // The socket mark is read but never surfaced on the telemetry
        // record; only CLASS_ID feeds `class_id`.
        AttributeKind::Mark => {}
        AttributeKind::MemInfo | AttributeKind::Unrecognized(_) => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn push_attr(buf: &mut Vec<u8>, kind: u16, payload: &[u8]) {
        let nla_len = (NLA_HDRLEN + payload.len()) as u16;
        buf.extend_from_slice(&nla_len.to_le_bytes());
        buf.extend_from_slice(&kind.to_le_bytes());
        buf.extend_from_slice(payload);
        let pad = align4_pad(nla_len as usize);
        buf.extend(std::iter::repeat(0u8).take(pad));
    }

    fn base_inet_diag_msg(family: u8) -> Vec<u8> {
        let mut buf = vec![family, 1 /* state */, 0, 0];
        buf.extend_from_slice(&0u16.to_le_bytes()); // sport
        buf.extend_from_slice(&0u16.to_le_bytes()); // dport
        buf.extend_from_slice(&[0u8; 16]); // source
        buf.extend_from_slice(&[0u8; 16]); // destination
        buf.extend_from_slice(&0u32.to_le_bytes()); // interface
        buf.extend_from_slice(&0u32.to_le_bytes()); // cookie lo
        buf.extend_from_slice(&0u32.to_le_bytes()); // cookie hi
        buf.extend_from_slice(&0u32.to_le_bytes()); // expires
        buf.extend_from_slice(&0u32.to_le_bytes()); // rqueue
        buf.extend_from_slice(&0u32.to_le_bytes()); // wqueue
        buf.extend_from_slice(&0u32.to_le_bytes()); // uid
        buf.extend_from_slice(&0u32.to_le_bytes()); // inode
        assert_eq!(buf.len(), INET_DIAG_MSG_LEN);
        buf
    }

    #[test]
    fn ipv4_cubic_socket() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        push_attr(&mut body, 2, &[0u8; TCP_INFO_LEN]); // INFO, zeroed
        push_attr(&mut body, 4, b"cubic"); // CONG
        push_attr(&mut body, 7, &[0u8; SK_MEMINFO_LEN]); // SKMEMINFO

        let (record, _pad) = decode_socket(&body, Duration::from_secs(1)).unwrap();
        assert_eq!(record.congestion, CongestionAlgorithm::Cubic);
        assert_eq!(record.summary.addr_len(), 4);
        assert!(record.bbr_info.is_none());
    }

    #[test]
    fn ipv6_bbr_socket_with_bbrinfo() {
        let mut body = base_inet_diag_msg(libc::AF_INET6 as u8);
        push_attr(&mut body, 4, b"bbr"); // CONG
        let mut bbr_payload = vec![0u8; BBR_INFO_LEN];
        bbr_payload[8..12].copy_from_slice(&123u32.to_le_bytes());
        push_attr(&mut body, 16, &bbr_payload); // BBRINFO

        let (record, _pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert_eq!(record.congestion, CongestionAlgorithm::Bbr1);
        assert_eq!(record.summary.addr_len(), 16);
        assert_eq!(record.bbr_info.unwrap().min_rtt_us, 123);
    }

    #[test]
    fn unknown_attribute_kind_is_skipped() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        push_attr(&mut body, 99, &[0u8; 8]);
        push_attr(&mut body, 4, b"cubic");

        let (record, _pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert_eq!(record.congestion, CongestionAlgorithm::Cubic);
    }

    #[test]
    fn oversized_info_reads_known_prefix_and_skips_surplus() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        let mut payload = vec![0u8; TCP_INFO_LEN];
        payload[6] = 0x73; // snd_wscale=7, rcv_wscale=3
        payload[7] = 0x01; // delivery_rate_app_limited=1
        payload.extend(std::iter::repeat(0xAAu8).take(24)); // surplus from a newer kernel
        push_attr(&mut body, 2, &payload);
        push_attr(&mut body, 4, b"cubic"); // must still be reachable after the skip

        let (record, _pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert_eq!(record.tcp_info.snd_wscale, 7);
        assert_eq!(record.tcp_info.rcv_wscale, 3);
        assert!(record.tcp_info.delivery_rate_app_limited);
        assert_eq!(record.congestion, CongestionAlgorithm::Cubic);
    }

    #[test]
    fn non_default_attributes_only_set_when_present_and_nonzero() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        push_attr(&mut body, 5, &[0u8]); // TOS == 0, should stay None
        push_attr(&mut body, 6, &[5u8]); // TCLASS != 0

        let (record, _pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert_eq!(record.tos, None);
        assert_eq!(record.tclass, Some(5));
    }

    #[test]
    fn truncated_body_is_an_error() {
        let body = vec![0u8; 10];
        assert!(matches!(
            decode_socket(&body, Duration::from_secs(0)),
            Err(DecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn mark_without_class_id_does_not_surface_class_id() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        push_attr(&mut body, 15, &99u32.to_le_bytes()); // MARK, nonzero

        let (record, _pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert_eq!(record.class_id, None);
    }

    #[test]
    fn class_id_attribute_is_independent_of_mark() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        push_attr(&mut body, 15, &99u32.to_le_bytes()); // MARK, nonzero, unrelated
        push_attr(&mut body, 17, &7u32.to_le_bytes()); // CLASS_ID

        let (record, _pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert_eq!(record.class_id, Some(7));
    }

    #[test]
    fn decode_attributes_accumulates_pad_bytes() {
        let mut body = base_inet_diag_msg(libc::AF_INET as u8);
        push_attr(&mut body, 6, &[5u8]); // TCLASS, 1-byte payload needs 3 bytes align pad

        let (_record, pad) = decode_socket(&body, Duration::from_secs(0)).unwrap();
        assert!(pad > 0);
    }
}
