//! homecrab
//!
//! A small home network DNS server with a DHCP lease manager.
//!
//! Serves plain DNS over UDP and TCP as well as DNS-over-TLS and DNS-over-HTTPS. Clients of the
//! encrypted transports may identify themselves with a [client id][client_id], carried as the
//! leading label of the TLS server name ([RFC-6066][RFC-6066] SNI) or as the last segment of
//! the DNS-over-HTTPS request path. Local names are answered from a static hosts table and from
//! the hostnames of DHCP leases managed through the [administrative API][api].
//!
//! [RFC-6066]: https://www.rfc-editor.org/rfc/rfc6066#section-3
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod client_id;
pub mod config;
pub mod dhcp;
pub mod dns;
pub mod doh;
pub mod error;
pub mod lease_store;
pub mod tls;

pub use api::new as new_http;
pub use client_id::{ClientId, ServerIdentity};
pub use config::{Config, SharedConfig};
pub use dns::new as new_dns;
pub use lease_store::{FileLeaseStore, InMemoryLeaseStore};
