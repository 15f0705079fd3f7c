//! Error types.

use crate::client_id::ClientIdError;
use crate::dhcp::DhcpError;
use axum::extract::rejection::JsonRejection;
use std::net::IpAddr;
use trust_dns_proto::error::ProtoError;

/// Error enumerates the possible homecrab error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned by administrative endpoints that depend on interface probing, which homecrab
    /// doesn't do: [`/control/dhcp/interfaces`][crate::api#controldhcpinterfaces-get] and
    /// [`/control/dhcp/find_active_dhcp`][crate::api#controldhcpfind_active_dhcp-post].
    #[error("not implemented")]
    NotImplemented,

    /// Returned by the query pipeline when the client id carried by an encrypted transport
    /// can't be accepted. The message is always tagged with `client id check: `.
    #[error("client id check: {0}")]
    ClientIdCheck(#[from] ClientIdError),

    /// Returned when a DHCP administrative request is rejected.
    #[error(transparent)]
    Dhcp(#[from] DhcpError),

    /// Returned when clients `POST` invalid JSON.
    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),

    /// Returned when a DNS-over-HTTPS request doesn't carry a DNS message the way
    /// [RFC-8484][RFC-8484] describes.
    ///
    /// [RFC-8484]: https://www.rfc-editor.org/rfc/rfc8484
    #[error("invalid DNS-over-HTTPS request: {0}")]
    InvalidDoHRequest(&'static str),

    /// Returned when a DNS-over-HTTPS `GET` request's `dns` parameter isn't base64url.
    #[error("invalid DNS-over-HTTPS request: {0}")]
    InvalidDoHEncoding(#[from] base64::DecodeError),

    /// Returned for DNS-over-HTTPS requests using a method other than `GET` or `POST`.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Returned when a DNS message received over an encrypted transport can't be parsed.
    #[error("malformed DNS message: {0}")]
    MalformedMessage(ProtoError),

    /// Returned when a DNS-over-TLS client announces, or a response would need, a message
    /// longer than the two-byte length prefix allows.
    #[error("DNS message too large: {0} bytes")]
    MessageTooLarge(usize),

    /// Returned when the [`Config::api_bind_addr`][`crate::config::Config::api_bind_addr`] is
    /// not a loopback address, or an address within a private network space. The
    /// [homecrab HTTP API][crate::api] can reconfigure the network's DHCP server and must never
    /// be reachable from the internet.
    #[error("API bind address ({0}) must be a loopback or private IP")]
    InsecureAPIBind(IpAddr),

    /// Returned when [`TlsConfig::server_name`][`crate::config::TlsConfig::server_name`] is
    /// neither a DNS name nor a single-level wildcard `*.<suffix>`.
    #[error("invalid TLS server name {0:?}")]
    InvalidServerName(String),

    /// Returned when an encrypted listener is configured without a certificate and key.
    #[error("{0} requires tls.cert_path and tls.key_path")]
    MissingCertificate(&'static str),

    /// Returned when a PEM file holds no usable certificate or private key.
    #[error("no {kind} found in {path}")]
    InvalidPEM { kind: &'static str, path: String },

    /// Returned when the TLS server configuration can't be built.
    #[error("TLS error")]
    Tls(#[from] rustls::Error),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON from disk (e.g. to
    /// [trying to load a `Config`][crate::config::Config::try_from_file], or to
    /// [trying to load a `FileLeaseStore`][crate::lease_store::FileLeaseStore::try_from_file]) fails
    /// due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the homecrab DNS server encounters a generic DNS protocol error.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),
}
