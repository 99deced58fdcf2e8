//! Constant tables mapping kernel-defined numeric values to named Rust
//! enums. Each table is a thin generated `From`/`Into` pair over the
//! primitive wire type rather than a hand-maintained match; unrecognized
//! values round-trip through `UnrecognizedVariant` instead of being
//! rejected, since the kernel is free to report values this crate does
//! not yet know about.
//!
//! Constants come from the Linux kernel headers (`/usr/include/linux`);
//! see `man 7 netlink` and `man 7 sock_diag`.

#[macro_use]
mod macros;

/// Constants related to netlink message headers (types, flags).
pub mod nl;
/// Constants related to netlink socket operations.
pub mod socket;

/// Round `len` up to the next 4-byte netlink attribute alignment boundary.
pub fn alignto(len: usize) -> usize {
    (len + libc::NLA_ALIGNTO as usize - 1) & !(libc::NLA_ALIGNTO as usize - 1)
}

/// Max supported message length for netlink messages.
pub const MAX_NL_LENGTH: usize = 32768;

#[cfg(test)]
mod test {
    use super::socket::*;

    #[test]
    fn test_generated_enum_into_from() {
        let inet: libc::c_int = AddrFamily::Inet.into();
        assert_eq!(inet, libc::AF_INET);

        let inet_variant = AddrFamily::from(libc::AF_INET);
        assert_eq!(inet_variant, AddrFamily::Inet);
    }

    #[test]
    fn test_alignto() {
        assert_eq!(alignto(0), 0);
        assert_eq!(alignto(1), 4);
        assert_eq!(alignto(4), 4);
        assert_eq!(alignto(5), 8);
    }
}
