use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Lease duration used when none is configured: one day.
pub const DEFAULT_LEASE_DURATION: u32 = 86_400;

/// A rejected DHCPv4 or DHCPv6 configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid subnet mask {0}")]
    InvalidSubnetMask(Ipv4Addr),

    #[error("{field} {ip} is outside subnet {subnet}")]
    OutsideSubnet {
        field: &'static str,
        ip: Ipv4Addr,
        subnet: Ipv4Network,
    },

    #[error("range start {start} is greater than range end {end}")]
    InvertedRange { start: Ipv4Addr, end: Ipv4Addr },

    #[error("gateway ip {0} is inside the range")]
    GatewayInRange(Ipv4Addr),
}

/// DHCPv4 settings as configured and as reported by the status endpoint.
///
/// The family counts as configured once `range_start` is set; the remaining fields are then
/// required and checked by [`V4ServerConf::validate`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct V4ServerConf {
    #[serde(default)]
    pub gateway_ip: Option<Ipv4Addr>,
    #[serde(default)]
    pub subnet_mask: Option<Ipv4Addr>,
    #[serde(default)]
    pub range_start: Option<Ipv4Addr>,
    #[serde(default)]
    pub range_end: Option<Ipv4Addr>,
    /// Seconds; 0 means [`DEFAULT_LEASE_DURATION`].
    #[serde(default)]
    pub lease_duration: u32,
}

/// A DHCPv4 configuration that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V4Network {
    pub gateway_ip: Ipv4Addr,
    pub subnet: Ipv4Network,
    pub range_start: Ipv4Addr,
    pub range_end: Ipv4Addr,
    pub lease_duration: u32,
}

impl V4ServerConf {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.range_start.is_some()
    }

    /// Check the configuration describes a usable address pool.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfError`] naming the first problem found.
    pub fn validate(&self) -> Result<V4Network, ConfError> {
        let gateway_ip = self.gateway_ip.ok_or(ConfError::Missing("gateway_ip"))?;
        let mask = self.subnet_mask.ok_or(ConfError::Missing("subnet_mask"))?;
        let range_start = self.range_start.ok_or(ConfError::Missing("range_start"))?;
        let range_end = self.range_end.ok_or(ConfError::Missing("range_end"))?;

        let subnet = Ipv4Network::with_netmask(gateway_ip, mask)
            .map_err(|_| ConfError::InvalidSubnetMask(mask))?;
        for (field, ip) in [("range_start", range_start), ("range_end", range_end)] {
            if !subnet.contains(ip) {
                return Err(ConfError::OutsideSubnet { field, ip, subnet });
            }
        }
        if range_start > range_end {
            return Err(ConfError::InvertedRange {
                start: range_start,
                end: range_end,
            });
        }
        if (range_start..=range_end).contains(&gateway_ip) {
            return Err(ConfError::GatewayInRange(gateway_ip));
        }

        Ok(V4Network {
            gateway_ip,
            subnet,
            range_start,
            range_end,
            lease_duration: match self.lease_duration {
                0 => DEFAULT_LEASE_DURATION,
                d => d,
            },
        })
    }
}

/// DHCPv6 settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct V6ServerConf {
    #[serde(default)]
    pub range_start: Option<Ipv6Addr>,
    /// Seconds; 0 means [`DEFAULT_LEASE_DURATION`].
    #[serde(default)]
    pub lease_duration: u32,
}

impl V6ServerConf {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.range_start.is_some()
    }
}
