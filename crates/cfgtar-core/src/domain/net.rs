//! CIDR arithmetic shared by the `ipv4net`/`ipv6net` validators and the
//! address helpers of the template function set.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub const fn bits(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    pub const fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    pub fn matches(self, addr: &IpAddr) -> bool {
        Self::of(addr) == self
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("ipv4"),
            Self::V6 => f.write_str("ipv6"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("invalid CIDR address: {0}")]
    Malformed(String),
    #[error("not an {expected} network: {input}")]
    WrongVersion { expected: IpVersion, input: String },
    #[error("address out of range")]
    OutOfRange,
}

/// An interface address in CIDR notation, e.g. `192.168.1.2/24`.
///
/// Unlike a network prefix, the host bits are kept: `addr()` returns the
/// address as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, CidrError> {
        if prefix > IpVersion::of(&addr).bits() {
            return Err(CidrError::Malformed(format!("{addr}/{prefix}")));
        }
        Ok(Self { addr, prefix })
    }

    /// Parse and require a specific IP version.
    pub fn parse_version(input: &str, version: IpVersion) -> Result<Self, CidrError> {
        let cidr: Self = input.parse()?;
        if cidr.version() != version {
            return Err(CidrError::WrongVersion {
                expected: version,
                input: input.to_owned(),
            });
        }
        Ok(cidr)
    }

    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    pub const fn version(&self) -> IpVersion {
        IpVersion::of(&self.addr)
    }

    /// Netmask as an address, e.g. `255.255.255.0`.
    pub fn mask(&self) -> IpAddr {
        self.from_bits(self.mask_bits())
    }

    /// Lowest address of the network.
    pub fn first(&self) -> IpAddr {
        self.from_bits(self.addr_bits() & self.mask_bits())
    }

    /// Highest address of the network.
    pub fn last(&self) -> IpAddr {
        self.from_bits(self.addr_bits() | (!self.mask_bits() & self.width_mask()))
    }

    /// `base + offset`, failing when it leaves the network.
    pub fn offset_from(&self, base: IpAddr, offset: u128) -> Result<IpAddr, CidrError> {
        let last = self.to_bits(self.last());
        self.to_bits(base)
            .checked_add(offset)
            .filter(|pos| *pos <= last)
            .map(|pos| self.from_bits(pos))
            .ok_or(CidrError::OutOfRange)
    }

    fn width_mask(&self) -> u128 {
        match self.version() {
            IpVersion::V4 => u128::from(u32::MAX),
            IpVersion::V6 => u128::MAX,
        }
    }

    fn mask_bits(&self) -> u128 {
        let bits = self.version().bits();
        if self.prefix == 0 {
            return 0;
        }
        (self.width_mask() << (bits - self.prefix)) & self.width_mask()
    }

    fn addr_bits(&self) -> u128 {
        self.to_bits(self.addr)
    }

    fn to_bits(&self, addr: IpAddr) -> u128 {
        match addr {
            IpAddr::V4(a) => u128::from(u32::from(a)),
            IpAddr::V6(a) => u128::from(a),
        }
    }

    fn from_bits(&self, bits: u128) -> IpAddr {
        match self.version() {
            IpVersion::V4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
            IpVersion::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
        }
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CidrError::Malformed(s.to_owned());
        let (addr, prefix) = s.trim().split_once('/').ok_or_else(malformed)?;
        let addr: IpAddr = addr.parse().map_err(|_| malformed())?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let prefix: u8 = prefix.parse().map_err(|_| malformed())?;
        Self::new(addr, prefix).map_err(|_| malformed())
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn ipv4_boundaries() {
        let cidr: Cidr = "192.168.1.77/24".parse().unwrap();
        assert_eq!(cidr.addr(), v4("192.168.1.77"));
        assert_eq!(cidr.mask(), v4("255.255.255.0"));
        assert_eq!(cidr.first(), v4("192.168.1.0"));
        assert_eq!(cidr.last(), v4("192.168.1.255"));
    }

    #[test]
    fn ipv6_mask_prints_compressed() {
        let cidr: Cidr = "2001:db8::5/64".parse().unwrap();
        assert_eq!(cidr.mask().to_string(), "ffff:ffff:ffff:ffff::");
        assert_eq!(cidr.first().to_string(), "2001:db8::");
    }

    #[test]
    fn zero_and_full_prefixes() {
        let all: Cidr = "10.1.2.3/0".parse().unwrap();
        assert_eq!(all.first(), v4("0.0.0.0"));
        assert_eq!(all.last(), v4("255.255.255.255"));

        let host: Cidr = "10.1.2.3/32".parse().unwrap();
        assert_eq!(host.first(), host.last());
    }

    #[test]
    fn offsets_stay_inside_network() {
        let cidr: Cidr = "10.0.0.7/30".parse().unwrap();
        assert_eq!(cidr.offset_from(cidr.first(), 2).unwrap(), v4("10.0.0.6"));
        assert_eq!(cidr.offset_from(cidr.addr(), 1), Err(CidrError::OutOfRange));
    }

    #[test]
    fn rejects_bad_input() {
        assert!("10.0.0.1".parse::<Cidr>().is_err());
        assert!("10.0.0.1/33".parse::<Cidr>().is_err());
        assert!("10.0.0.1/-1".parse::<Cidr>().is_err());
        assert!(matches!(
            Cidr::parse_version("::1/128", IpVersion::V4),
            Err(CidrError::WrongVersion { .. })
        ));
    }
}
