//! CIDR-prefix synthesis: given two addresses of the same family, find the
//! smallest network that contains both. The optional CIDR-based IP filter
//! collaborator is out of scope, but this small pure helper underlies it
//! and is part of the core's helper set (§8 property 2).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A synthesized network: an address masked to `prefix_len` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    pub network: IpAddr,
    pub prefix_len: u8,
}

/// Find the smallest-prefix (most specific) network that contains both `a`
/// and `b`. Returns `None` if the two addresses are not the same family.
///
/// Mirrors the ported filter collaborator's approach: starting from the
/// narrowest possible mask and widening until both addresses fall inside
/// it, rather than computing the common-prefix bit length directly.
pub fn range_to_cidr(a: IpAddr, b: IpAddr) -> Option<Cidr> {
    match (a, b) {
        (IpAddr::V4(a4), IpAddr::V4(b4)) => Some(range_to_cidr_v4(a4, b4)),
        (IpAddr::V6(a6), IpAddr::V6(b6)) => Some(range_to_cidr_v6(a6, b6)),
        _ => None,
    }
}

fn mask_u32(prefix_len: u32) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !0u32 << (32 - prefix_len)
    }
}

fn mask_u128(prefix_len: u32) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        !0u128 << (128 - prefix_len)
    }
}

fn range_to_cidr_v4(a: Ipv4Addr, b: Ipv4Addr) -> Cidr {
    let a_bits = u32::from(a);
    let b_bits = u32::from(b);
    for prefix_len in (0..=32u32).rev() {
        let mask = mask_u32(prefix_len);
        let network = a_bits & mask;
        if b_bits & mask == network {
            return Cidr {
                network: IpAddr::V4(Ipv4Addr::from(network)),
                prefix_len: prefix_len as u8,
            };
        }
    }
    unreachable!("prefix_len == 0 always matches")
}

fn range_to_cidr_v6(a: Ipv6Addr, b: Ipv6Addr) -> Cidr {
    let a_bits = u128::from(a);
    let b_bits = u128::from(b);
    for prefix_len in (0..=128u32).rev() {
        let mask = mask_u128(prefix_len);
        let network = a_bits & mask;
        if b_bits & mask == network {
            return Cidr {
                network: IpAddr::V6(Ipv6Addr::from(network)),
                prefix_len: prefix_len as u8,
            };
        }
    }
    unreachable!("prefix_len == 0 always matches")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identical_v4_address_yields_32_singleton() {
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let cidr = range_to_cidr(a, a).unwrap();
        assert_eq!(cidr.prefix_len, 32);
        assert_eq!(cidr.network, a);
    }

    #[test]
    fn identical_v6_address_yields_128_singleton() {
        let a: IpAddr = "2001:db8::1".parse().unwrap();
        let cidr = range_to_cidr(a, a).unwrap();
        assert_eq!(cidr.prefix_len, 128);
        assert_eq!(cidr.network, a);
    }

    #[test]
    fn v4_common_prefix_contains_both() {
        let a: IpAddr = "192.168.1.5".parse().unwrap();
        let b: IpAddr = "192.168.1.250".parse().unwrap();
        let cidr = range_to_cidr(a, b).unwrap();
        assert_eq!(cidr.prefix_len, 24);
        assert_eq!(cidr.network, "192.168.1.0".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn mismatched_family_returns_none() {
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "::1".parse().unwrap();
        assert!(range_to_cidr(a, b).is_none());
    }
}
