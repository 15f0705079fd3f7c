use std::fmt;

/// The protocol a query arrived over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Udp,
    Tcp,
    Tls,
    Https,
    Quic,
    DnsCrypt,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Udp => "udp",
            Protocol::Tcp => "tcp",
            Protocol::Tls => "tls",
            Protocol::Https => "https",
            Protocol::Quic => "quic",
            Protocol::DnsCrypt => "dnscrypt",
        };
        f.write_str(name)
    }
}

/// A query's transport together with the identity signal it carries.
///
/// Front ends pick the variant when they build the query context, so the protocol and the
/// signal read from it can't disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
    DnsCrypt,
    /// DNS-over-TLS, with the server name the client sent in its handshake (empty if none).
    Tls { server_name: String },
    /// DNS-over-QUIC, with the server name the client sent in its handshake (empty if none).
    Quic { server_name: String },
    /// DNS-over-HTTPS, with the request's URL path.
    Https { path: String },
}

/// The part of a [`Transport`] a client id is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySignal<'a> {
    None,
    ServerName(&'a str),
    RequestPath(&'a str),
}

impl Transport {
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        match self {
            Transport::Udp => Protocol::Udp,
            Transport::Tcp => Protocol::Tcp,
            Transport::DnsCrypt => Protocol::DnsCrypt,
            Transport::Tls { .. } => Protocol::Tls,
            Transport::Quic { .. } => Protocol::Quic,
            Transport::Https { .. } => Protocol::Https,
        }
    }

    /// Decide which extraction strategy applies to this transport.
    #[must_use]
    pub fn identity_signal(&self) -> IdentitySignal<'_> {
        match self {
            Transport::Udp | Transport::Tcp | Transport::DnsCrypt => IdentitySignal::None,
            Transport::Tls { server_name } | Transport::Quic { server_name } => {
                IdentitySignal::ServerName(server_name)
            }
            Transport::Https { path } => IdentitySignal::RequestPath(path),
        }
    }
}
