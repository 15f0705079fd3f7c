//! DHCP lease management.
//!
//! homecrab keeps the network's DHCP configuration and its lease table, and exposes both through
//! the [administrative HTTP API][crate::api]. Leases carry a hostname; the DNS pipeline answers
//! `A`/`AAAA` queries for `<hostname>.<local_domain>` from them.
//!
//! Packet-level DHCP (offers, acknowledgements, conflict probing) is not handled here. Dynamic
//! leases enter the table through the persisted [lease store][crate::lease_store]; static leases
//! through [`DhcpServer::add_static_lease`].

mod conf;
mod lease;

use crate::error::Error;
use crate::lease_store::DynLeaseStore;
use lease::valid_hostname;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{error, info};

pub use conf::{ConfError, V4Network, V4ServerConf, V6ServerConf, DEFAULT_LEASE_DURATION};
pub use lease::{HardwareAddr, InvalidHardwareAddr, Lease};

/// `SharedDhcp` is the [`DhcpServer`] shared by the HTTP API and the DNS pipeline.
pub type SharedDhcp = Arc<RwLock<DhcpServer>>;

/// DHCP administrative errors, reported to API clients as HTTP 400.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum DhcpError {
    #[error("DHCPv4 or DHCPv6 configuration must be complete")]
    IncompleteConfig,

    #[error("invalid DHCPv4 configuration: {0}")]
    InvalidV4Config(ConfError),

    #[error("DHCPv4 is not configured")]
    V4NotConfigured,

    #[error("invalid IP")]
    InvalidIp,

    #[error(transparent)]
    InvalidHardwareAddr(#[from] InvalidHardwareAddr),

    #[error("invalid hostname {0:?}")]
    InvalidHostname(String),

    #[error("ip {ip} is outside subnet {subnet}")]
    LeaseOutsideSubnet {
        ip: IpAddr,
        subnet: ipnetwork::Ipv4Network,
    },

    #[error("ip {0} is the gateway address")]
    LeaseIsGateway(IpAddr),

    #[error("static lease for ip {0} already exists")]
    DuplicateIp(IpAddr),

    #[error("static lease for hardware address {0} already exists")]
    DuplicateHardwareAddr(HardwareAddr),

    #[error("static lease with hostname {0:?} already exists")]
    DuplicateHostname(String),

    #[error("static lease for ip {0} not found")]
    LeaseNotFound(IpAddr),
}

/// The DHCP server configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct DhcpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub interface_name: String,
    #[serde(default)]
    pub v4: V4ServerConf,
    #[serde(default)]
    pub v6: V6ServerConf,
}

impl DhcpConfig {
    /// Check the configuration can be applied. A disabled server is always valid; an enabled
    /// one needs at least one complete address family and every configured family must be
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns [`DhcpError::InvalidV4Config`] for a bad DHCPv4 family, and
    /// [`DhcpError::IncompleteConfig`] when neither family is configured.
    pub fn validate(&self) -> Result<(), DhcpError> {
        if !self.enabled {
            return Ok(());
        }

        let v4_enabled = self.v4.is_configured();
        if v4_enabled {
            self.v4.validate().map_err(DhcpError::InvalidV4Config)?;
        }
        let v6_enabled = self.v6.is_configured();

        if !v4_enabled && !v6_enabled {
            return Err(DhcpError::IncompleteConfig);
        }
        Ok(())
    }
}

/// A partial update of the [`DhcpConfig`]. Absent fields keep their current value; a present
/// address family replaces the configured one entirely.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct DhcpConfigUpdate {
    pub enabled: Option<bool>,
    pub interface_name: Option<String>,
    pub v4: Option<V4ServerConf>,
    pub v6: Option<V6ServerConf>,
}

/// Which leases to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseKind {
    /// Unexpired dynamic leases.
    Dynamic,
    Static,
}

#[allow(clippy::module_name_repetitions)]
pub struct DhcpServer {
    conf: DhcpConfig,
    lease_store: DynLeaseStore,
}

impl DhcpServer {
    /// Create a server from a configuration and the store its leases live in.
    ///
    /// # Errors
    ///
    /// Returns a [`DhcpError`] if `conf` doesn't [validate][DhcpConfig::validate].
    pub fn new(conf: DhcpConfig, lease_store: DynLeaseStore) -> Result<Self, DhcpError> {
        conf.validate()?;
        Ok(Self { conf, lease_store })
    }

    #[must_use]
    pub fn shared(self) -> SharedDhcp {
        Arc::new(RwLock::new(self))
    }

    #[must_use]
    pub fn config(&self) -> &DhcpConfig {
        &self.conf
    }

    pub async fn leases(&self, kind: LeaseKind, now: OffsetDateTime) -> Vec<Lease> {
        self.lease_store
            .leases()
            .await
            .into_iter()
            .filter(|lease| match kind {
                LeaseKind::Static => lease.is_static(),
                LeaseKind::Dynamic => !lease.is_static() && !lease.is_expired(now),
            })
            .collect()
    }

    /// Addresses of the unexpired leases whose hostname is `hostname`, compared ignoring ASCII
    /// case.
    pub async fn addresses_for(&self, hostname: &str, now: OffsetDateTime) -> Vec<IpAddr> {
        self.lease_store
            .leases()
            .await
            .into_iter()
            .filter(|lease| lease.hostname.eq_ignore_ascii_case(hostname) && !lease.is_expired(now))
            .map(|lease| lease.ip)
            .collect()
    }

    /// Apply a partial configuration update.
    ///
    /// # Errors
    ///
    /// Returns a [`DhcpError`] if the updated configuration doesn't
    /// [validate][DhcpConfig::validate]; the current configuration is then left untouched.
    pub fn set_config(&mut self, update: DhcpConfigUpdate) -> Result<(), DhcpError> {
        let mut conf = self.conf.clone();
        if let Some(enabled) = update.enabled {
            conf.enabled = enabled;
        }
        if let Some(interface_name) = update.interface_name {
            conf.interface_name = interface_name;
        }
        if let Some(v4) = update.v4 {
            conf.v4 = v4;
        }
        if let Some(v6) = update.v6 {
            conf.v6 = v6;
        }

        conf.validate()?;
        info!(
            "DHCP config updated: enabled={} interface={:?}",
            conf.enabled, conf.interface_name
        );
        self.conf = conf;
        Ok(())
    }

    /// Add a static lease. IPv4 leases must fall inside the configured DHCPv4 subnet and can't
    /// use the gateway address. Dynamic leases for the same address or hardware address are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`Error::Dhcp`] if the lease is rejected, or a store error if
    /// the new lease table can't be saved.
    pub async fn add_static_lease(&mut self, mut lease: Lease) -> Result<(), Error> {
        lease.expires = None;
        if !lease.hostname.is_empty() && !valid_hostname(&lease.hostname) {
            return Err(DhcpError::InvalidHostname(lease.hostname).into());
        }
        if let IpAddr::V4(ip) = lease.ip {
            let net = self
                .conf
                .v4
                .validate()
                .map_err(|_| DhcpError::V4NotConfigured)?;
            if !net.subnet.contains(ip) {
                return Err(DhcpError::LeaseOutsideSubnet {
                    ip: lease.ip,
                    subnet: net.subnet,
                }
                .into());
            }
            if ip == net.gateway_ip {
                return Err(DhcpError::LeaseIsGateway(lease.ip).into());
            }
        }

        let mut leases = self.lease_store.leases().await;
        for existing in leases.iter().filter(|l| l.is_static()) {
            if existing.ip == lease.ip {
                return Err(DhcpError::DuplicateIp(lease.ip).into());
            }
            if existing.mac == lease.mac {
                return Err(DhcpError::DuplicateHardwareAddr(lease.mac).into());
            }
            if !lease.hostname.is_empty() && existing.hostname.eq_ignore_ascii_case(&lease.hostname)
            {
                return Err(DhcpError::DuplicateHostname(lease.hostname).into());
            }
        }

        leases.retain(|l| l.is_static() || (l.ip != lease.ip && l.mac != lease.mac));
        info!("DHCP: added static lease {} -> {}", lease.mac, lease.ip);
        leases.push(lease);
        self.lease_store.set_leases(leases).await
    }

    /// Remove the static lease matching `lease`'s address and hardware address.
    ///
    /// # Errors
    ///
    /// Returns [`DhcpError::LeaseNotFound`] if there is no such static lease, or a store error if
    /// the new lease table can't be saved.
    pub async fn remove_static_lease(&mut self, lease: &Lease) -> Result<(), Error> {
        let mut leases = self.lease_store.leases().await;
        let before = leases.len();
        leases.retain(|l| !(l.is_static() && l.ip == lease.ip && l.mac == lease.mac));
        if leases.len() == before {
            return Err(DhcpError::LeaseNotFound(lease.ip).into());
        }
        info!("DHCP: removed static lease {} -> {}", lease.mac, lease.ip);
        self.lease_store.set_leases(leases).await
    }

    /// Disable the server, forget its configuration and drop every lease.
    pub async fn reset(&mut self) {
        self.conf = DhcpConfig::default();
        if let Err(err) = self.lease_store.reset().await {
            error!("DHCP: resetting lease store: {err}");
        }
        info!("DHCP: reset");
    }
}
