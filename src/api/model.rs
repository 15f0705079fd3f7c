use crate::dhcp::{DhcpError, Lease, V4ServerConf, V6ServerConf};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(super) struct DhcpStatusResponse {
    pub enabled: bool,
    pub interface_name: String,
    pub v4: V4ServerConf,
    pub v6: V6ServerConf,
    pub leases: Vec<Lease>,
    pub static_leases: Vec<Lease>,
}

/// Body of the static lease endpoints. Fields are kept as text so a missing or malformed
/// address is reported as a DHCP error rather than a JSON rejection.
#[derive(Deserialize, Debug, Clone, Default)]
pub(super) struct StaticLeaseRequest {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub hostname: String,
}

impl TryFrom<StaticLeaseRequest> for Lease {
    type Error = DhcpError;

    fn try_from(req: StaticLeaseRequest) -> Result<Self, Self::Error> {
        let ip = req
            .ip
            .and_then(|ip| ip.parse().ok())
            .ok_or(DhcpError::InvalidIp)?;
        Ok(Lease {
            mac: req.mac.parse()?,
            ip,
            hostname: req.hostname,
            expires: None,
        })
    }
}
