use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use time::OffsetDateTime;

/// A 48-bit hardware (MAC) address, written as six colon- or hyphen-separated hex octets.
#[derive(SerializeDisplay, DeserializeFromStr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareAddr([u8; 6]);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hardware address {0:?}")]
pub struct InvalidHardwareAddr(String);

impl FromStr for HardwareAddr {
    type Err = InvalidHardwareAddr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidHardwareAddr(s.to_string());
        let mut octets = [0u8; 6];
        let mut parts = s.split([':', '-']);
        for octet in &mut octets {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// A DHCP lease. Leases without an expiry are static.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub mac: HardwareAddr,
    pub ip: IpAddr,
    #[serde(default)]
    pub hostname: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires: Option<OffsetDateTime>,
}

impl Lease {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.expires.is_none()
    }

    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires.map_or(false, |expires| expires <= now)
    }
}

/// Check that a lease hostname can be served as a single DNS label.
pub(crate) fn valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname.len() <= 63
        && !hostname.starts_with('-')
        && !hostname.ends_with('-')
        && hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
