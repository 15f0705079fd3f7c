use crate::client_id::DNS_QUERY_PATH;
use crate::dns::Pipeline;
use crate::doh::routes;
use hyper::server::conn::Http;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve DNS-over-HTTPS on `addr`, terminating TLS with `acceptor`.
///
/// # Errors
///
/// Returns an error if the address can't be bound.
pub async fn serve_tls(
    addr: SocketAddr,
    acceptor: TlsAcceptor,
    pipeline: Arc<Pipeline>,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let router = routes::new(pipeline, request_timeout);
    info!("DoH listening on https://{addr}{DNS_QUERY_PATH}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!("DoH: accepting connection: {err}");
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let router = router.clone();
        tokio::spawn(async move {
            let tls_stream = match timeout(TLS_HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                Ok(Ok(tls_stream)) => tls_stream,
                Ok(Err(err)) => {
                    debug!("DoH: handshake with {peer} failed: {err}");
                    return;
                }
                Err(_) => {
                    debug!("DoH: handshake with {peer} timed out");
                    return;
                }
            };
            if let Err(err) = Http::new().serve_connection(tls_stream, router).await {
                debug!("DoH: connection from {peer} closed: {err}");
            }
        });
    }
}

/// Serve DNS-over-HTTPS on `addr` without TLS, for deployments behind a TLS-terminating proxy.
///
/// # Errors
///
/// Returns an error if the address can't be bound or the server fails.
pub async fn serve_plain(
    addr: SocketAddr,
    pipeline: Arc<Pipeline>,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let router = routes::new(pipeline, request_timeout);
    warn!("DoH listening without TLS on http://{addr}{DNS_QUERY_PATH}");
    axum::Server::try_bind(&addr)?
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
