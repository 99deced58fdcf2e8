//! Error taxonomy for the collection pipeline (see the error handling
//! design notes: setup-fatal, recoverable-transient, decode-skip,
//! cycle-abandon, sink-transient). Only [`SetupError`] is ever surfaced to
//! a controller's caller; the rest are counted in statistics and handled
//! locally.

use std::fmt;
use std::io;

/// Socket or request construction failures that abort a controller before
/// it can run any cycles.
#[derive(Debug)]
pub enum SetupError {
    /// `socket(2)` failed.
    Socket(io::Error),
    /// `bind(2)` failed.
    Bind(io::Error),
    /// `setsockopt(2)` failed (e.g. `SO_RCVTIMEO`).
    SetSockOpt(io::Error),
    /// A worker thread could not be spawned.
    Spawn(io::Error),
    /// The configuration failed validation before a controller could start.
    InvalidConfig(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Socket(e) => write!(f, "failed to open netlink socket: {e}"),
            SetupError::Bind(e) => write!(f, "failed to bind netlink socket: {e}"),
            SetupError::SetSockOpt(e) => write!(f, "failed to configure netlink socket: {e}"),
            SetupError::Spawn(e) => write!(f, "failed to spawn worker thread: {e}"),
            SetupError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Socket(e)
            | SetupError::Bind(e)
            | SetupError::SetSockOpt(e)
            | SetupError::Spawn(e) => Some(e),
            SetupError::InvalidConfig(_) => None,
        }
    }
}

/// Errors encountered by a netlink reader inside a single cycle. None of
/// these abort the reader; each is counted and the loop continues.
#[derive(Debug)]
pub enum CycleError {
    /// `recvfrom(2)` failed for a reason other than a timeout.
    Recv(io::Error),
    /// The datagram was shorter than a netlink header (16 bytes).
    TruncatedDatagram { len: usize },
    /// The message carried `NLMSG_ERROR`, `NLMSG_NOOP`, or `NLMSG_OVERRUN`.
    SentinelError { nlmsg_type: u16 },
    /// A data-bearing message did not carry `NLM_F_MULTI`, or carried flags
    /// other than `NLM_F_MULTI`.
    UnexpectedFlags { flags: u16 },
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Recv(e) => write!(f, "recvfrom failed: {e}"),
            CycleError::TruncatedDatagram { len } => {
                write!(f, "datagram too short to hold a netlink header: {len} bytes")
            }
            CycleError::SentinelError { nlmsg_type } => {
                write!(f, "netlink sentinel message type {nlmsg_type}")
            }
            CycleError::UnexpectedFlags { flags } => {
                write!(f, "unexpected netlink message flags: {flags:#06x}")
            }
        }
    }
}

impl std::error::Error for CycleError {}

/// Errors encountered while decoding one socket's attribute stream. None of
/// these abort decoding of the rest of the message; the decoder moves on to
/// the next attribute or the next socket.
#[derive(Debug)]
pub enum DecodeError {
    /// The attribute header's declared length is smaller than the 4-byte
    /// header itself.
    AttributeTooShort { nla_len: u16 },
    /// The body ended mid-way through an attribute header or payload.
    UnexpectedEof,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::AttributeTooShort { nla_len } => {
                write!(f, "attribute length {nla_len} is smaller than its header")
            }
            DecodeError::UnexpectedEof => write!(f, "attribute stream ended unexpectedly"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Downstream-sink failures. Always counted, never fatal to the cycle.
#[derive(Debug)]
pub enum SinkError {
    /// The record could not be serialized for transmission.
    Serialize(String),
    /// The transport write failed.
    Write(io::Error),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Serialize(msg) => write!(f, "failed to serialize telemetry record: {msg}"),
            SinkError::Write(e) => write!(f, "failed to write to downstream sink: {e}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Write(e) => Some(e),
            SinkError::Serialize(_) => None,
        }
    }
}
