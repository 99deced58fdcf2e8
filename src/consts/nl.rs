//! Netlink message-header constants: message types and flags relevant to a
//! `sock_diag` dump exchange.

bitflags::bitflags! {
    /// Flags carried in the netlink message header's `flags` field.
    ///
    /// Only the subset needed to build a dump request and to validate
    /// incoming data messages is represented.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NlmF: u16 {
        /// This message is a request to the kernel.
        const REQUEST = libc::NLM_F_REQUEST as u16;
        /// The request asks for a full table dump.
        const DUMP = libc::NLM_F_DUMP as u16;
        /// This message is one of several making up a multi-part dump.
        const MULTI = libc::NLM_F_MULTI as u16;
    }
}

/// Values the netlink header's `type` field takes for non-data messages, plus
/// the one data type this crate ever sends (`SOCK_DIAG_BY_FAMILY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NlmsgType {
    /// No-op; ignored by convention, treated here as an error sentinel
    /// because the core never expects one mid-dump.
    Noop,
    /// Kernel-reported error, possibly wrapping a request acknowledgment.
    Error,
    /// End of a multi-part dump.
    Done,
    /// The receive buffer was too small for a message; data was dropped.
    Overrun,
    /// `SOCK_DIAG_BY_FAMILY`: a `sock_diag` dump request or data message.
    SockDiagByFamily,
    /// Any other value, preserved for diagnostics.
    Other(u16),
}

/// Request/response message type used to ask for a `sock_diag` dump.
pub const SOCK_DIAG_BY_FAMILY: u16 = 20;

impl From<u16> for NlmsgType {
    fn from(v: u16) -> Self {
        match v as i32 {
            libc::NLMSG_NOOP => NlmsgType::Noop,
            libc::NLMSG_ERROR => NlmsgType::Error,
            libc::NLMSG_DONE => NlmsgType::Done,
            libc::NLMSG_OVERRUN => NlmsgType::Overrun,
            _ if v == SOCK_DIAG_BY_FAMILY => NlmsgType::SockDiagByFamily,
            _ => NlmsgType::Other(v),
        }
    }
}
