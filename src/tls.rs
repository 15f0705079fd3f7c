//! TLS server configuration shared by the DNS-over-TLS and DNS-over-HTTPS listeners.

use crate::error::Error;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use rustls_pemfile::{certs, private_key};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

/// ALPN protocol id for DNS-over-TLS ([RFC-7858](https://www.rfc-editor.org/rfc/rfc7858)).
pub const ALPN_DOT: &[u8] = b"dot";
/// ALPN protocol ids for DNS-over-HTTPS.
pub const ALPN_DOH: &[&[u8]] = &[b"h2", b"http/1.1"];

/// Build a server configuration from the PEM encoded certificate chain at `cert_path` and the
/// private key at `key_path`, advertising `alpn`.
///
/// # Errors
///
/// Returns [`Error::IO`] if either file can't be read, [`Error::InvalidPEM`] if they hold no
/// certificate or key, and [`Error::Tls`] if the key doesn't fit the certificate.
pub fn server_config(
    cert_path: &str,
    key_path: &str,
    alpn: &[&[u8]],
) -> Result<Arc<ServerConfig>, Error> {
    let cert_chain = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;
    config.alpn_protocols = alpn.iter().map(|proto| proto.to_vec()).collect();
    Ok(Arc::new(config))
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let cert_chain = certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if cert_chain.is_empty() {
        return Err(Error::InvalidPEM {
            kind: "certificate",
            path: path.to_string(),
        });
    }
    Ok(cert_chain)
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    private_key(&mut reader)?.ok_or_else(|| Error::InvalidPEM {
        kind: "private key",
        path: path.to_string(),
    })
}
