use crate::client_id::error::ClientIdError;

/// Path prefix DNS-over-HTTPS queries are served under.
pub const DNS_QUERY_PATH: &str = "/dns-query";

/// Extract the client id candidate from a DNS-over-HTTPS request path.
///
/// Accepts `/dns-query`, `/dns-query/<id>`, each with an optional trailing slash.
///
/// # Errors
///
/// Returns [`ClientIdError::InvalidPath`] when the path isn't rooted at [`DNS_QUERY_PATH`] and
/// [`ClientIdError::ExtraPathParts`] when it has more than one segment after it.
pub fn client_id_from_path(path: &str) -> Result<Option<&str>, ClientIdError> {
    let invalid = || ClientIdError::InvalidPath(path.to_string());

    let rest = path.strip_prefix(DNS_QUERY_PATH).ok_or_else(invalid)?;
    if rest.is_empty() || rest == "/" {
        return Ok(None);
    }

    // Rules out "/dns-queryfoo".
    let rest = rest.strip_prefix('/').ok_or_else(invalid)?;
    let segment = rest.strip_suffix('/').unwrap_or(rest);
    if segment.is_empty() {
        return Err(invalid());
    }
    if segment.contains('/') {
        return Err(ClientIdError::ExtraPathParts(path.to_string()));
    }

    Ok(Some(segment))
}
