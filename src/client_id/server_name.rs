use crate::client_id::error::ClientIdError;

/// Match the server name a TLS client presented against the configured host server name.
///
/// A literal `host` must equal `client` exactly and never yields a candidate. A wildcard `host`
/// of the form `*.<suffix>` accepts the bare `suffix`, without a candidate, or exactly one label
/// followed by `.<suffix>`, returning that label. No case folding is done here; the transport
/// layer hands over the name as negotiated.
///
/// The returned label is not validated.
///
/// # Errors
///
/// Returns [`ClientIdError::ServerNameMismatch`] or [`ClientIdError::WildcardMismatch`] when
/// `client` doesn't match `host`.
pub fn match_server_name<'a>(host: &str, client: &'a str) -> Result<Option<&'a str>, ClientIdError> {
    let Some(suffix) = host.strip_prefix("*.") else {
        if client == host {
            return Ok(None);
        }
        return Err(ClientIdError::ServerNameMismatch {
            client: client.to_string(),
            host: host.to_string(),
        });
    };

    if client == suffix {
        return Ok(None);
    }

    match client.split_once('.') {
        Some((label, rest)) if !label.is_empty() && rest == suffix => Ok(Some(label)),
        _ => Err(ClientIdError::WildcardMismatch {
            client: client.to_string(),
            host: host.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_exact_match() {
        assert_eq!(match_server_name("example.com", "example.com"), Ok(None));
    }

    #[test]
    fn literal_is_case_sensitive() {
        let err = match_server_name("example.com", "Example.com").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"client server name "Example.com" doesn't match host server name "example.com""#
        );
    }

    #[test]
    fn literal_rejects_subdomain() {
        assert!(matches!(
            match_server_name("example.com", "cli.example.com"),
            Err(ClientIdError::ServerNameMismatch { .. })
        ));
    }

    #[test]
    fn wildcard_base_domain() {
        assert_eq!(match_server_name("*.example.com", "example.com"), Ok(None));
    }

    #[test]
    fn wildcard_single_label() {
        assert_eq!(
            match_server_name("*.example.com", "cli.example.com"),
            Ok(Some("cli"))
        );
    }

    #[test]
    fn wildcard_rejects_nested_labels() {
        let err = match_server_name("*.example.com", "a.b.example.com").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"client server name "a.b.example.com" doesn't match host server name wildcard "*.example.com""#
        );
    }

    #[test]
    fn wildcard_rejects_empty_label_and_bare_suffix_lookalikes() {
        for client in [".example.com", "xexample.com", "example.com.", "", "com"] {
            assert!(
                matches!(
                    match_server_name("*.example.com", client),
                    Err(ClientIdError::WildcardMismatch { .. })
                ),
                "{client:?} should not match"
            );
        }
    }

    #[test]
    fn wildcard_label_is_not_validated() {
        assert_eq!(
            match_server_name("*.example.com", "!!!.example.com"),
            Ok(Some("!!!"))
        );
    }
}
