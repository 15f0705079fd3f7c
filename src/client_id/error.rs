//! Client id error types.

/// Errors produced while deriving a client id from a query's transport.
///
/// The `Display` output of each variant is the bare reason. The pipeline step wraps it in
/// [`Error::ClientIdCheck`][crate::error::Error::ClientIdCheck], which adds the
/// `client id check: ` tag operators grep for.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum ClientIdError {
    /// The TLS server name presented by the client is not the configured literal host name.
    #[error("client server name {client:?} doesn't match host server name {host:?}")]
    ServerNameMismatch { client: String, host: String },

    /// The TLS server name presented by the client is neither the wildcard's base domain nor a
    /// single label beneath it.
    #[error("client server name {client:?} doesn't match host server name wildcard {host:?}")]
    WildcardMismatch { client: String, host: String },

    /// The DNS-over-HTTPS request path isn't rooted at `/dns-query`.
    #[error("invalid path {0:?}")]
    InvalidPath(String),

    /// The DNS-over-HTTPS request path has more than one segment after `/dns-query`.
    #[error("invalid path {0:?}: extra parts")]
    ExtraPathParts(String),

    /// A candidate was extracted but isn't a valid client id.
    #[error("invalid client id: {0}")]
    Invalid(#[from] GrammarError),
}

/// Grammar violations reported by [`validate`][super::validate].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("client id {id:?} is too long, max: {max}")]
    TooLong { id: String, max: usize },

    #[error("invalid char {ch:?} at index {index} in client id {id:?}")]
    InvalidChar { ch: char, index: usize, id: String },
}
