//! Client identification.
//!
//! Encrypted DNS transports let a client assert a *client id* that the rest of the query
//! pipeline uses to pick per-client settings. Two signals carry it:
//!
//! ## TLS server name (DNS-over-TLS, DNS-over-QUIC)
//!
//! When the configured [`tls.server_name`][crate::config::TlsConfig::server_name] is a wildcard,
//! e.g. `*.dns.example.com`, a client connecting with the SNI `laptop.dns.example.com` is
//! identified as `laptop`. Connecting as `dns.example.com` is anonymous. Any other name is
//! rejected.
//!
//! ## DNS-over-HTTPS path
//!
//! ```text
//! /dns-query          anonymous
//! /dns-query/laptop   client id "laptop"
//! ```
//!
//! Client ids are at most [64][MAX_CLIENT_ID_LEN] characters long and are drawn from the
//! configured [`Alphabet`]. Every rejection surfaces in the pipeline as an
//! [`Error::ClientIdCheck`][crate::error::Error::ClientIdCheck], rendered with the
//! `client id check: ` tag (and `invalid client id: ` for grammar violations).

mod error;
mod path;
mod resolver;
mod server_name;
mod transport;
mod validate;

use std::fmt;
use std::str::FromStr;

pub use error::{ClientIdError, GrammarError};
pub use path::{client_id_from_path, DNS_QUERY_PATH};
pub use resolver::{process_client_id, resolve, ServerIdentity};
pub use server_name::match_server_name;
pub use transport::{IdentitySignal, Protocol, Transport};
pub use validate::{validate, Alphabet, MAX_CLIENT_ID_LEN};

/// A validated, non-empty client id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClientId {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s, Alphabet::default())
    }
}
