use crate::client_id::error::ClientIdError;
use crate::client_id::path::client_id_from_path;
use crate::client_id::server_name::match_server_name;
use crate::client_id::transport::{IdentitySignal, Transport};
use crate::client_id::validate::{validate, Alphabet};
use crate::client_id::ClientId;
use crate::dns::context::{Outcome, QueryContext};
use tracing::debug;

/// The server's own identity, as far as client id extraction is concerned.
///
/// Built once from configuration and shared read-only by every query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    /// Literal DNS name, or single-level wildcard `*.<suffix>`. `None` when no TLS server name
    /// is configured, in which case TLS-bearing transports never carry a client id.
    pub host_server_name: Option<String>,
    pub alphabet: Alphabet,
}

impl ServerIdentity {
    #[must_use]
    pub fn new(host_server_name: Option<String>, alphabet: Alphabet) -> Self {
        Self {
            host_server_name,
            alphabet,
        }
    }
}

/// Determine the client id asserted by `transport`, if any.
///
/// # Errors
///
/// Returns a [`ClientIdError`] when the server name or request path doesn't fit the expected
/// shape, or when the extracted candidate isn't a valid client id.
pub fn resolve(
    transport: &Transport,
    identity: &ServerIdentity,
) -> Result<Option<ClientId>, ClientIdError> {
    let candidate = match transport.identity_signal() {
        IdentitySignal::None => None,
        IdentitySignal::ServerName(client) => match &identity.host_server_name {
            Some(host) => match_server_name(host, client)?,
            None => None,
        },
        IdentitySignal::RequestPath(path) => client_id_from_path(path)?,
    };

    match candidate {
        Some(candidate) => Ok(Some(validate(candidate, identity.alphabet)?)),
        None => Ok(None),
    }
}

/// Pipeline step: resolve the query's client id and record the outcome on `ctx`.
///
/// On success the context holds the client id (empty for anonymous clients) and
/// [`Outcome::Success`]. On failure the client id is cleared and the outcome is
/// [`Outcome::Error`] wrapping [`Error::ClientIdCheck`][crate::error::Error::ClientIdCheck].
/// Running it again over the same context gives the same result.
pub fn process_client_id(ctx: &mut QueryContext, identity: &ServerIdentity) {
    match resolve(ctx.transport(), identity) {
        Ok(client_id) => {
            ctx.set_client_id(client_id);
            ctx.set_outcome(Outcome::Success);
        }
        Err(err) => {
            debug!("client id check failed for {} query: {err}", ctx.protocol());
            ctx.set_client_id(None);
            ctx.set_outcome(Outcome::Error(err.into()));
        }
    }
}
