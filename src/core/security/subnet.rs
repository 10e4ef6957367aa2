//! Trusted subnet matching

use crate::utils::error::{MetricsError, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// An IPv4 or IPv6 network in CIDR notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustedSubnet {
    network: IpAddr,
    prefix: u8,
}

impl TrustedSubnet {
    /// Parse `address/prefix`; host bits of the address are cleared
    pub fn parse(cidr: &str) -> Result<Self> {
        let cidr = cidr.trim();
        let (address, prefix) = cidr
            .split_once('/')
            .ok_or_else(|| MetricsError::config(format!("Invalid CIDR '{}': missing prefix", cidr)))?;

        let address: IpAddr = address
            .parse()
            .map_err(|e| MetricsError::config(format!("Invalid CIDR '{}': {}", cidr, e)))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|e| MetricsError::config(format!("Invalid CIDR '{}': {}", cidr, e)))?;

        let max_prefix = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max_prefix {
            return Err(MetricsError::config(format!(
                "Invalid CIDR '{}': prefix exceeds {}",
                cidr, max_prefix
            )));
        }

        let network = match address {
            IpAddr::V4(v4) => IpAddr::V4((u32::from(v4) & v4_mask(prefix)).into()),
            IpAddr::V6(v6) => IpAddr::V6((u128::from(v6) & v6_mask(prefix)).into()),
        };

        Ok(Self { network, prefix })
    }

    /// Whether `ip` lies inside the subnet; address families never mix
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(network), IpAddr::V4(ip)) => {
                u32::from(ip) & v4_mask(self.prefix) == u32::from(network)
            }
            (IpAddr::V6(network), IpAddr::V6(ip)) => {
                u128::from(ip) & v6_mask(self.prefix) == u128::from(network)
            }
            (IpAddr::V4(_), IpAddr::V6(ip)) => ip
                .to_ipv4_mapped()
                .is_some_and(|v4| self.contains(IpAddr::V4(v4))),
            _ => false,
        }
    }
}

impl FromStr for TrustedSubnet {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TrustedSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

fn v4_mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

fn v6_mask(prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix))
    }
}
