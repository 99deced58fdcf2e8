impl_var!(
    /// Socket address families relevant to netlink and to the decoded
    /// `inet_diag_msg` family field.
    AddrFamily, libc::c_int,
    Inet => libc::AF_INET,
    Inet6 => libc::AF_INET6,
    Netlink => libc::AF_NETLINK
);

impl_var!(
    /// Netlink protocol numbers. Only the `sock_diag` dump protocol is used;
    /// the rest of the kernel's netlink family space is out of scope.
    NlFamily, libc::c_int,
    /// Also known as `NETLINK_INET_DIAG` on older kernels; same wire value.
    SockDiag => libc::NETLINK_SOCK_DIAG
);
