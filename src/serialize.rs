//! Wire encoding for outbound [`TelemetryRecord`]s.
//!
//! The on-wire telemetry schema is explicitly out of scope for the core;
//! this module supplies the one concrete encoding the core needs in order
//! to have something to hand to a [`crate::sink::Sink`]. A glue layer that
//! wants a different downstream schema (protobuf, JSON, ...) can replace
//! this module's single entry point without touching the decoder.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::record::{CongestionAlgorithm, TelemetryRecord};

bitflags::bitflags! {
    /// Which optional fields follow the fixed record body.
    struct OptionalFields: u8 {
        const TOS = 1 << 0;
        const TCLASS = 1 << 1;
        const SHUTDOWN_STATE = 1 << 2;
        const CLASS_ID = 1 << 3;
        const BBR_INFO = 1 << 4;
    }
}

/// Serialize `record` into a flat little-endian byte encoding.
pub fn encode_record(record: &TelemetryRecord) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);
    write_record(&mut buf, record)?;
    Ok(buf)
}

fn write_record<W: Write>(w: &mut W, record: &TelemetryRecord) -> io::Result<()> {
    w.write_u64::<LittleEndian>(record.captured_at.as_secs())?;
    w.write_u32::<LittleEndian>(record.captured_at.subsec_nanos())?;

    w.write_u8(record.summary.family)?;
    w.write_u8(record.summary.state)?;
    w.write_u8(record.summary.timer)?;
    w.write_u8(record.summary.retrans)?;
    w.write_u16::<LittleEndian>(record.summary.id.source_port)?;
    w.write_u16::<LittleEndian>(record.summary.id.destination_port)?;
    let addr_len = record.summary.addr_len().max(4);
    w.write_all(&record.summary.id.source[..addr_len])?;
    w.write_all(&record.summary.id.destination[..addr_len])?;
    w.write_u32::<LittleEndian>(record.summary.id.interface)?;
    w.write_u64::<LittleEndian>(record.summary.id.cookie)?;
    w.write_u32::<LittleEndian>(record.summary.uid)?;
    w.write_u32::<LittleEndian>(record.summary.inode)?;

    w.write_u32::<LittleEndian>(record.tcp_info.rtt)?;
    w.write_u32::<LittleEndian>(record.tcp_info.rttvar)?;
    w.write_u32::<LittleEndian>(record.tcp_info.snd_cwnd)?;
    w.write_u32::<LittleEndian>(record.tcp_info.retransmits as u32)?;
    w.write_u8(record.tcp_info.snd_wscale)?;
    w.write_u8(record.tcp_info.rcv_wscale)?;
    w.write_u8(record.tcp_info.delivery_rate_app_limited as u8)?;
    w.write_u8(record.tcp_info.fastopen_client_fail)?;

    w.write_u32::<LittleEndian>(record.mem_info.rmem_alloc)?;
    w.write_u32::<LittleEndian>(record.mem_info.wmem_alloc)?;
    w.write_u32::<LittleEndian>(record.mem_info.drops)?;

    let congestion: u8 = match record.congestion {
        CongestionAlgorithm::Unknown => 0,
        CongestionAlgorithm::Cubic => 1,
        CongestionAlgorithm::Bbr1 => 2,
        CongestionAlgorithm::Bbr2 => 3,
    };
    w.write_u8(congestion)?;

    let mut present = OptionalFields::empty();
    present.set(OptionalFields::TOS, record.tos.is_some());
    present.set(OptionalFields::TCLASS, record.tclass.is_some());
    present.set(
        OptionalFields::SHUTDOWN_STATE,
        record.shutdown_state.is_some(),
    );
    present.set(OptionalFields::CLASS_ID, record.class_id.is_some());
    present.set(OptionalFields::BBR_INFO, record.bbr_info.is_some());
    w.write_u8(present.bits())?;

    if let Some(tos) = record.tos {
        w.write_u8(tos)?;
    }
    if let Some(tclass) = record.tclass {
        w.write_u8(tclass)?;
    }
    if let Some(state) = record.shutdown_state {
        w.write_u8(state)?;
    }
    if let Some(class_id) = record.class_id {
        w.write_u32::<LittleEndian>(class_id)?;
    }
    if let Some(bbr) = record.bbr_info {
        w.write_u32::<LittleEndian>(bbr.bw_lo)?;
        w.write_u32::<LittleEndian>(bbr.bw_hi)?;
        w.write_u32::<LittleEndian>(bbr.min_rtt_us)?;
        w.write_u32::<LittleEndian>(bbr.pacing_gain)?;
        w.write_u32::<LittleEndian>(bbr.cwnd_gain)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::{InetDiagMsg, SkMemInfo, TcpInfo};
    use std::time::Duration;

    fn sample_record() -> TelemetryRecord {
        TelemetryRecord {
            captured_at: Duration::from_secs(1_700_000_000),
            summary: InetDiagMsg {
                family: libc::AF_INET as u8,
                ..InetDiagMsg::default()
            },
            tcp_info: TcpInfo::default(),
            mem_info: SkMemInfo::default(),
            congestion: CongestionAlgorithm::Cubic,
            tos: None,
            tclass: None,
            shutdown_state: None,
            class_id: None,
            bbr_info: None,
        }
    }

    #[test]
    fn encodes_without_error_and_is_non_empty() {
        let bytes = encode_record(&sample_record()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn optional_fields_extend_the_encoding() {
        let mut record = sample_record();
        let without_optionals = encode_record(&record).unwrap();

        record.tos = Some(7);
        let with_tos = encode_record(&record).unwrap();
        assert_eq!(with_tos.len(), without_optionals.len() + 1);
    }
}
