//! Netlink header framing and `inet_diag_req_v2` dump-request construction.
//!
//! All multi-byte fields on the wire are little-endian; this module never
//! relies on host struct layout or pointer casts, only explicit byte
//! writes through [`byteorder`].

use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::config::Family;
use crate::consts::nl::{NlmF, NlmsgType, SOCK_DIAG_BY_FAMILY};

/// Size of a netlink message header on the wire.
pub const NLMSG_HDRLEN: usize = 16;
/// Size of a netlink attribute header on the wire.
pub const NLA_HDRLEN: usize = 4;
/// Size of the logical `inet_diag_req_v2` dump request, header included.
pub const DUMP_REQUEST_LEN: usize = 72;

/// `IPPROTO_TCP`.
const IPPROTO_TCP: u8 = 6;
/// `TCP_ESTABLISHED`, used to build the `states` bitmask.
const TCP_ESTABLISHED: u32 = 1;

/// A decoded netlink message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NlHeader {
    /// Total message length, including this header.
    pub length: u32,
    /// Raw `nl_type` value.
    pub nlmsg_type: u16,
    /// Raw `nl_flags` value.
    pub flags: u16,
    /// Sequence number.
    pub sequence: u32,
    /// Sending/receiving port id.
    pub pid: u32,
}

impl NlHeader {
    /// Parse the 16-byte netlink header from the front of `buf`.
    ///
    /// `buf` must contain at least [`NLMSG_HDRLEN`] bytes.
    pub fn parse(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < NLMSG_HDRLEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "netlink header truncated",
            ));
        }
        let mut cursor = Cursor::new(buf);
        let length = cursor.read_u32::<LittleEndian>()?;
        let nlmsg_type = cursor.read_u16::<LittleEndian>()?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let sequence = cursor.read_u32::<LittleEndian>()?;
        let pid = cursor.read_u32::<LittleEndian>()?;
        Ok(NlHeader {
            length,
            nlmsg_type,
            flags,
            sequence,
            pid,
        })
    }

    /// The interpreted message type.
    pub fn message_type(&self) -> NlmsgType {
        NlmsgType::from(self.nlmsg_type)
    }

    /// The message's flag bits, as a [`NlmF`] bitset. Bits outside the set
    /// this crate models are dropped; callers that need to detect stray
    /// bits should compare `self.flags` directly.
    pub fn flag_bits(&self) -> NlmF {
        NlmF::from_bits_truncate(self.flags)
    }
}

/// Outcome of classifying one netlink message per the message-type policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// `NLMSG_DONE`: end of the dump.
    Done,
    /// A data-bearing `sock_diag` message carrying exactly `NLM_F_MULTI`.
    Data,
    /// `NLMSG_NOOP`, `NLMSG_ERROR`, `NLMSG_OVERRUN`, or a data message with
    /// unexpected flags.
    Error,
}

/// Classify a parsed header per §4.1's message-type policy.
pub fn classify(header: &NlHeader) -> MessageClass {
    match header.message_type() {
        NlmsgType::Done => MessageClass::Done,
        NlmsgType::Noop | NlmsgType::Error | NlmsgType::Overrun => MessageClass::Error,
        _ => {
            if header.flags == NlmF::MULTI.bits() {
                MessageClass::Data
            } else {
                MessageClass::Error
            }
        }
    }
}

/// Build the bytes of an `inet_diag_req_v2` dump request for `family`.
///
/// `sequence` is the netlink sequence number; `idiag_ext` is the bitmask of
/// kernel extensions to request (`0xFF` requests everything this crate
/// recognizes). The returned buffer is exactly [`DUMP_REQUEST_LEN`] bytes,
/// with no unused trailing slack.
pub fn build_dump_request(family: Family, sequence: u32, idiag_ext: u8) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::with_capacity(DUMP_REQUEST_LEN));
    write_dump_request(&mut buf, family, sequence, idiag_ext)
        .expect("writes to an in-memory Vec<u8> never fail");
    buf.into_inner()
}

/// Rewrite only the sequence field of an existing dump-request buffer, in
/// place, matching the controller's per-cycle sequence-number bump without
/// rebuilding the whole request.
pub fn rewrite_sequence(buf: &mut [u8], sequence: u32) {
    buf[8..12].copy_from_slice(&sequence.to_le_bytes());
}

fn write_dump_request<W: Write>(
    w: &mut W,
    family: Family,
    sequence: u32,
    idiag_ext: u8,
) -> io::Result<()> {
    // nlmsghdr
    w.write_u32::<LittleEndian>(DUMP_REQUEST_LEN as u32)?;
    w.write_u16::<LittleEndian>(SOCK_DIAG_BY_FAMILY)?;
    w.write_u16::<LittleEndian>((NlmF::REQUEST | NlmF::DUMP).bits())?;
    w.write_u32::<LittleEndian>(sequence)?;
    w.write_u32::<LittleEndian>(0)?; // pid

    // inet_diag_req_v2
    w.write_u8(family.raw())?;
    w.write_u8(IPPROTO_TCP)?;
    w.write_u8(idiag_ext)?;
    w.write_u8(0)?; // pad
    w.write_u32::<LittleEndian>(1 << TCP_ESTABLISHED)?;

    // inet_diag_sockid: zeroed to match every socket.
    w.write_all(&[0u8; 48])?;
    Ok(())
}

/// A decoded attribute TLV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrHeader {
    /// Total attribute length, including this 4-byte header.
    pub nla_len: u16,
    /// The attribute kind.
    pub nla_type: u16,
}

impl AttrHeader {
    /// Parse a 4-byte attribute header from `r`.
    pub fn parse<R: Read>(r: &mut R) -> io::Result<Self> {
        let nla_len = r.read_u16::<LittleEndian>()?;
        let nla_type = r.read_u16::<LittleEndian>()?;
        Ok(AttrHeader { nla_len, nla_type })
    }

    /// Declared payload length, i.e. `nla_len` minus this header's 4 bytes.
    /// Saturates to zero if the declared length is smaller than the header
    /// itself (caller should treat that as [`crate::error::DecodeError::AttributeTooShort`]).
    pub fn payload_len(&self) -> usize {
        (self.nla_len as usize).saturating_sub(NLA_HDRLEN)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dump_request_is_exact_length() {
        let req = build_dump_request(Family::Inet, 7, 0xFF);
        assert_eq!(req.len(), DUMP_REQUEST_LEN);
    }

    #[test]
    fn dump_request_fields_round_trip() {
        let req = build_dump_request(Family::Inet6, 42, 0xAB);
        let header = NlHeader::parse(&req).unwrap();
        assert_eq!(header.length, DUMP_REQUEST_LEN as u32);
        assert_eq!(header.nlmsg_type, SOCK_DIAG_BY_FAMILY);
        assert_eq!(header.flags, (NlmF::REQUEST | NlmF::DUMP).bits());
        assert_eq!(header.sequence, 42);
        assert_eq!(header.pid, 0);
        assert_eq!(req[16], Family::Inet6.raw());
        assert_eq!(req[17], IPPROTO_TCP);
        assert_eq!(req[18], 0xAB);
        assert_eq!(req[19], 0);
        let states = u32::from_le_bytes(req[20..24].try_into().unwrap());
        assert_eq!(states, 1 << TCP_ESTABLISHED);
        assert!(req[24..72].iter().all(|&b| b == 0));
    }

    #[test]
    fn rewrite_sequence_only_touches_sequence_field() {
        let mut req = build_dump_request(Family::Inet, 1, 0xFF);
        let before = req.clone();
        rewrite_sequence(&mut req, 99);
        assert_eq!(u32::from_le_bytes(req[8..12].try_into().unwrap()), 99);
        assert_eq!(&req[..8], &before[..8]);
        assert_eq!(&req[12..], &before[12..]);
    }

    #[test]
    fn classify_done_and_error_sentinels() {
        let done = NlHeader {
            length: 16,
            nlmsg_type: libc::NLMSG_DONE as u16,
            flags: 0,
            sequence: 0,
            pid: 0,
        };
        assert_eq!(classify(&done), MessageClass::Done);

        let err = NlHeader {
            length: 16,
            nlmsg_type: libc::NLMSG_ERROR as u16,
            flags: 0,
            sequence: 0,
            pid: 0,
        };
        assert_eq!(classify(&err), MessageClass::Error);

        let overrun = NlHeader {
            length: 16,
            nlmsg_type: libc::NLMSG_OVERRUN as u16,
            flags: 0,
            sequence: 0,
            pid: 0,
        };
        assert_eq!(classify(&overrun), MessageClass::Error);
    }

    #[test]
    fn classify_data_requires_exactly_multi() {
        let mut data = NlHeader {
            length: 100,
            nlmsg_type: SOCK_DIAG_BY_FAMILY,
            flags: NlmF::MULTI.bits(),
            sequence: 0,
            pid: 0,
        };
        assert_eq!(classify(&data), MessageClass::Data);

        data.flags = NlmF::MULTI.bits() | NlmF::REQUEST.bits();
        assert_eq!(classify(&data), MessageClass::Error);

        data.flags = 0;
        assert_eq!(classify(&data), MessageClass::Error);
    }

    #[test]
    fn attr_header_payload_len() {
        let mut buf = Cursor::new(vec![0u8; 4]);
        buf.write_u16::<LittleEndian>(12).unwrap();
        buf.write_u16::<LittleEndian>(4).unwrap();
        let mut cursor = Cursor::new(buf.into_inner());
        let header = AttrHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.nla_len, 12);
        assert_eq!(header.nla_type, 4);
        assert_eq!(header.payload_len(), 8);
    }
}
