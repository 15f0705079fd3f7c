//! DNS front ends and the query pipeline they share.
//!
//! Every inbound query, whatever transport it arrived on, is turned into a
//! [`QueryContext`][context::QueryContext] and run through the same
//! [`Pipeline`][pipeline::Pipeline]:
//!
//! 1. [`ClientIdStage`][pipeline::ClientIdStage] resolves the client id carried by encrypted
//!    transports (see [`crate::client_id`]). A rejected client id stops processing: the query is
//!    refused over DNS-over-TLS and answered with HTTP 400 over DNS-over-HTTPS.
//! 2. [`LocalHostsStage`][pipeline::LocalHostsStage] answers `A`/`AAAA` queries from the
//!    configured [`Config::hosts`][`crate::config::Config::hosts`] table and from DHCP lease
//!    hostnames under [`Config::local_domain`][`crate::config::Config::local_domain`].
//!
//! Anything left unanswered is refused.
//!
//! E.g. with config:
//! ```json
//! {
//!   "local_domain": "lan",
//!   "hosts": { "router.lan": ["192.168.1.1", "fd00::1"] },
//!   ...
//! }
//! ```
//!
//! A `A` class query for `router.lan` would return:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 router.lan +short A
//! 192.168.1.1
//! ```
//!
//! And once a static lease with hostname `nas` has been added through the
//! [`/control/dhcp/add_static_lease` API endpoint][crate::api#controldhcpadd_static_lease-post]:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 nas.lan +short A
//! 192.168.1.10
//! ```
//!
//! # Listeners
//!
//! * UDP and TCP on [`Config::dns_udp_bind_addr`][`crate::config::Config::dns_udp_bind_addr`]
//!   and [`Config::dns_tcp_bind_addr`][`crate::config::Config::dns_tcp_bind_addr`].
//! * DNS-over-TLS on [`TlsConfig::dot_bind_addr`][`crate::config::TlsConfig::dot_bind_addr`],
//!   see [`dot`].
//! * DNS-over-HTTPS on [`TlsConfig::doh_bind_addr`][`crate::config::TlsConfig::doh_bind_addr`],
//!   see [`crate::doh`].

pub mod context;
pub mod dot;
mod handlers;
pub mod pipeline;
pub mod server;

pub use context::{Answer, Outcome, QueryContext};
pub use handlers::Handler;
pub use pipeline::Pipeline;
pub use server::new;
