//! CIDR Block Value Object
//!
//! A canonical IPv4 network, viewed as the half-open address interval
//! `[start, end)` for overlap checks.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

use crate::shared::errors::DomainError;

/// Canonical IPv4 CIDR block (host bits are always zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock(Ipv4Net);

impl CidrBlock {
    /// Build a block from its network address and prefix length
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCidr` if the prefix is longer than 32 bits
    /// or the address has host bits set.
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, DomainError> {
        let net = Ipv4Net::new(network, prefix_len)
            .map_err(|e| DomainError::InvalidCidr(format!("{network}/{prefix_len}: {e}")))?;

        if net.network() != network {
            return Err(DomainError::InvalidCidr(format!(
                "{net} has host bits set (network address is {})",
                net.trunc()
            )));
        }

        Ok(Self(net))
    }

    /// Build the block of the given size that starts at `start`
    pub(crate) fn from_start(start: u64, prefix_len: u8) -> Option<Self> {
        let addr = u32::try_from(start).ok()?;
        Self::new(Ipv4Addr::from(addr), prefix_len).ok()
    }

    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.0.network()
    }

    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Number of addresses covered by the block
    #[must_use]
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len()))
    }

    /// First address as an integer
    #[must_use]
    pub fn start(&self) -> u64 {
        u64::from(u32::from(self.0.network()))
    }

    /// One past the last address as an integer
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start() + self.size()
    }

    /// True when the two blocks share at least one address
    #[must_use]
    pub fn overlaps(&self, other: &CidrBlock) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CidrBlock {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net: Ipv4Net = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidCidr(format!("'{s}' is not IPv4 CIDR notation")))?;
        Self::new(net.addr(), net.prefix_len())
    }
}

impl TryFrom<&str> for CidrBlock {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
