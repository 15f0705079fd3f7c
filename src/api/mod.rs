//! Administrative HTTP API for the DHCP server.
//!
//! Bound to [`Config::api_bind_addr`][`crate::config::Config::api_bind_addr`], which must be a
//! loopback or private address. Errors are returned as a JSON body of the form
//! `{"error": "..."}`.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.
//!
//! ## `/control/dhcp/status` (GET)
//!
//!   Returns the DHCP configuration along with the current leases:
//!
//!   ```json
//!   {
//!     "enabled": true,
//!     "interface_name": "eth0",
//!     "v4": { "gateway_ip": "192.168.1.1", "subnet_mask": "255.255.255.0",
//!             "range_start": "192.168.1.100", "range_end": "192.168.1.200",
//!             "lease_duration": 86400 },
//!     "v6": { "range_start": null, "lease_duration": 0 },
//!     "leases": [],
//!     "static_leases": [ { "mac": "aa:bb:cc:dd:ee:01", "ip": "192.168.1.10", "hostname": "nas" } ]
//!   }
//!   ```
//!
//!   `leases` lists unexpired dynamic leases only.
//!
//! ## `/control/dhcp/set_config` (POST)
//!
//!   Expects a JSON request body with any of the `enabled`, `interface_name`, `v4` and `v6`
//!   fields of the status response. Absent fields keep their value; a present `v4` or `v6`
//!   replaces that address family entirely. An address family counts as configured once its
//!   `range_start` is set.
//!
//!   Returns HTTP 400 (Bad Request) if the server is `enabled` without a configured address
//!   family, or if the DHCPv4 family is invalid (non-contiguous mask, range outside the
//!   gateway's subnet, inverted range, gateway inside the range).
//!
//! ## `/control/dhcp/interfaces` (GET)
//!
//!   Returns HTTP 501 (Not Implemented). homecrab doesn't probe network interfaces.
//!
//! ## `/control/dhcp/find_active_dhcp` (POST)
//!
//!   Returns HTTP 501 (Not Implemented). homecrab doesn't probe the network for other DHCP
//!   servers.
//!
//! ## `/control/dhcp/add_static_lease` (POST)
//!
//!   Expects a lease as JSON request body:
//!
//!   ```json
//!   { "mac": "aa:bb:cc:dd:ee:01", "ip": "192.168.1.10", "hostname": "nas" }
//!   ```
//!
//!   IPv4 leases must be inside the DHCPv4 subnet and can't use the gateway address. No two
//!   static leases may share an address, a hardware address or a hostname. Dynamic leases
//!   for the same address or hardware address are dropped. Returns HTTP 400 (Bad Request) if
//!   the lease is rejected, with `{"error": "invalid IP"}` when `ip` is missing or malformed.
//!
//!   The hostname is served over DNS as `<hostname>.<local_domain>`, see [`crate::dns`].
//!
//! ## `/control/dhcp/remove_static_lease` (POST)
//!
//!   Expects the same body as `add_static_lease`. Returns HTTP 400 (Bad Request) if no static
//!   lease matches both the `ip` and the `mac`.
//!
//! ## `/control/dhcp/reset` (POST)
//!
//!   Disables the server, clears its configuration and removes every lease, deleting the
//!   lease database file if there is one.

pub(crate) mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
