//! CIDR block parsing and host-range arithmetic.
//!
//! Parsing and mask arithmetic come from `ipnet`; this module adds the
//! usable-host view a pool needs (network and broadcast excluded).

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

use super::PoolError;

/// An IPv4 block in `address/prefix` form, normalized to its network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    net: Ipv4Net,
}

impl Cidr {
    /// Build a block from any address inside it and a prefix length.
    ///
    /// Host bits of `addr` are cleared, so `192.168.1.77/24` and
    /// `192.168.1.0/24` describe the same block.
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, PoolError> {
        let net = Ipv4Net::new(addr, prefix_len).map_err(|_| {
            PoolError::InvalidArgument(format!("prefix length {} is outside 0..=32", prefix_len))
        })?;
        Ok(Self::from(net))
    }

    /// The all-zero-host address of the block
    pub fn network(&self) -> Ipv4Addr {
        self.net.network()
    }

    /// The all-one-host address of the block
    pub fn broadcast(&self) -> Ipv4Addr {
        self.net.broadcast()
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    /// Subnet mask in dotted form, e.g. `255.255.255.0` for a /24
    pub fn mask(&self) -> Ipv4Addr {
        self.net.netmask()
    }

    /// Number of usable host addresses: `2^(32-prefix) - 2`, clamped to zero.
    ///
    /// /31 and /32 blocks have no usable hosts.
    pub fn host_count(&self) -> u64 {
        (1u64 << (32 - u32::from(self.prefix_len()))).saturating_sub(2)
    }

    /// First and last usable host as integers, or `None` when the block has
    /// no usable hosts.
    pub fn host_range(&self) -> Option<(u32, u32)> {
        if self.host_count() == 0 {
            return None;
        }
        Some((u32::from(self.network()) + 1, u32::from(self.broadcast()) - 1))
    }

    /// Whether `addr` lies strictly between the network and broadcast address
    pub fn contains_host(&self, addr: Ipv4Addr) -> bool {
        let value = u32::from(addr);
        self.host_range()
            .map_or(false, |(first, last)| value >= first && value <= last)
    }
}

impl From<Ipv4Net> for Cidr {
    fn from(net: Ipv4Net) -> Self {
        Self { net: net.trunc() }
    }
}

impl From<Cidr> for Ipv4Net {
    fn from(cidr: Cidr) -> Self {
        cidr.net
    }
}

impl FromStr for Cidr {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PoolError::InvalidArgument("CIDR cannot be empty".to_string()));
        }

        let net = s.parse::<Ipv4Net>().map_err(|_| {
            PoolError::InvalidArgument(format!(
                "'{}' is not an IPv4 block in a.b.c.d/prefix form with a prefix in 0..=32",
                s
            ))
        })?;

        Ok(Self::from(net))
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}
