//! DNS-over-TLS listener ([RFC-7858](https://www.rfc-editor.org/rfc/rfc7858)).

use crate::client_id::Transport;
use crate::dns::pipeline::{reply, Pipeline};
use crate::error::Error;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};
use trust_dns_server::client::op::{Message, ResponseCode};

const MAX_CONCURRENT_CONNECTIONS: usize = 1024;

const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DotServer {
    acceptor: TlsAcceptor,
    pipeline: Arc<Pipeline>,
    idle_timeout: Duration,
    connections: Arc<Semaphore>,
}

impl DotServer {
    #[must_use]
    pub fn new(acceptor: TlsAcceptor, pipeline: Arc<Pipeline>, idle_timeout: Duration) -> Self {
        Self {
            acceptor,
            pipeline,
            idle_timeout,
            connections: Arc::new(Semaphore::new(MAX_CONCURRENT_CONNECTIONS)),
        }
    }

    /// Accept connections from `listener` until the task is dropped.
    pub async fn run(self, listener: TcpListener) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(conn) => conn,
                Err(err) => {
                    warn!("DoT: accepting connection: {err}");
                    continue;
                }
            };

            let Ok(permit) = self.connections.clone().try_acquire_owned() else {
                warn!("DoT: connection limit reached, dropping {peer}");
                continue;
            };

            let acceptor = self.acceptor.clone();
            let pipeline = self.pipeline.clone();
            let idle_timeout = self.idle_timeout;
            tokio::spawn(async move {
                let _permit = permit;

                let tls_stream = match timeout(TLS_HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                    Ok(Ok(tls_stream)) => tls_stream,
                    Ok(Err(err)) => {
                        debug!("DoT: handshake with {peer} failed: {err}");
                        return;
                    }
                    Err(_) => {
                        debug!("DoT: handshake with {peer} timed out");
                        return;
                    }
                };
                // Clients that send no SNI get an empty server name.
                let server_name = tls_stream
                    .get_ref()
                    .1
                    .server_name()
                    .unwrap_or_default()
                    .to_string();

                if let Err(err) =
                    handle_connection(tls_stream, server_name, peer, &pipeline, idle_timeout).await
                {
                    debug!("DoT: connection from {peer} closed: {err}");
                }
            });
        }
    }
}

/// Bind `addr` and serve DNS-over-TLS on it.
///
/// # Errors
///
/// Returns an error if the address can't be bound.
pub async fn serve(addr: SocketAddr, server: DotServer) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("DoT listening on {addr}");
    server.run(listener).await;
    Ok(())
}

/// Serve the length-prefixed queries of one connection, whose client asked for `server_name`,
/// until the client closes it or stays idle past `idle_timeout`.
pub(crate) async fn handle_connection<S>(
    mut stream: S,
    server_name: String,
    peer: SocketAddr,
    pipeline: &Pipeline,
    idle_timeout: Duration,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let mut len_buf = [0u8; 2];
        match timeout(idle_timeout, stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) if err.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => {
                debug!("DoT: {peer} idle, closing");
                return Ok(());
            }
        }
        let msg_len = usize::from(u16::from_be_bytes(len_buf));
        if msg_len == 0 {
            continue;
        }

        let mut msg_buf = vec![0u8; msg_len];
        timeout(idle_timeout, stream.read_exact(&mut msg_buf))
            .await
            .map_err(|_| std::io::Error::from(ErrorKind::TimedOut))??;
        let request = Message::from_vec(&msg_buf).map_err(Error::MalformedMessage)?;

        let transport = Transport::Tls {
            server_name: server_name.clone(),
        };
        let response = match pipeline.handle_message(transport, &request).await {
            Ok(response) => response,
            Err(err) => {
                debug!("DoT: refusing query from {peer}: {err}");
                reply(&request, ResponseCode::Refused, Vec::new())
            }
        };

        let response = response.to_vec()?;
        let resp_len = u16::try_from(response.len())
            .map_err(|_| Error::MessageTooLarge(response.len()))?;
        stream.write_all(&resp_len.to_be_bytes()).await?;
        stream.write_all(&response).await?;
        stream.flush().await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::pipeline::tests::{query, test_pipeline};
    use tokio::io::{duplex, DuplexStream};
    use trust_dns_server::client::rr::RecordType;

    const IDLE: Duration = Duration::from_secs(5);

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn exchange(client: &mut DuplexStream, request: &Message) -> Message {
        let bytes = request.to_vec().unwrap();
        client
            .write_all(&u16::try_from(bytes.len()).unwrap().to_be_bytes())
            .await
            .unwrap();
        client.write_all(&bytes).await.unwrap();

        let mut len_buf = [0u8; 2];
        client.read_exact(&mut len_buf).await.unwrap();
        let mut response = vec![0u8; usize::from(u16::from_be_bytes(len_buf))];
        client.read_exact(&mut response).await.unwrap();
        Message::from_vec(&response).unwrap()
    }

    #[tokio::test]
    async fn answers_queries_until_closed() {
        let pipeline = test_pipeline().await;
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(async move {
            handle_connection(server, "laptop.dns.example.com".to_string(), peer(), &pipeline, IDLE)
                .await
        });

        for _ in 0..3 {
            let response = exchange(&mut client, &query("router.lan.", RecordType::A)).await;
            assert_eq!(response.response_code(), ResponseCode::NoError);
            assert_eq!(response.answers().len(), 1);
        }

        drop(client);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn refuses_mismatched_server_name() {
        let pipeline = test_pipeline().await;
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(async move {
            handle_connection(server, "laptop.example.org".to_string(), peer(), &pipeline, IDLE)
                .await
        });

        let response = exchange(&mut client, &query("router.lan.", RecordType::A)).await;
        assert_eq!(response.id(), 4242);
        assert_eq!(response.response_code(), ResponseCode::Refused);
        assert!(response.answers().is_empty());

        drop(client);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn skips_empty_frames() {
        let pipeline = test_pipeline().await;
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(async move {
            handle_connection(server, "dns.example.com".to_string(), peer(), &pipeline, IDLE).await
        });

        client.write_all(&0u16.to_be_bytes()).await.unwrap();
        let response = exchange(&mut client, &query("nas.lan.", RecordType::AAAA)).await;
        assert_eq!(response.answers().len(), 1);

        drop(client);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn malformed_message_closes_connection() {
        let pipeline = test_pipeline().await;
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(async move {
            handle_connection(server, "dns.example.com".to_string(), peer(), &pipeline, IDLE).await
        });

        client.write_all(&3u16.to_be_bytes()).await.unwrap();
        client.write_all(&[0xff, 0xff, 0xff]).await.unwrap();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(Error::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn idle_connection_is_closed() {
        let pipeline = test_pipeline().await;
        let (_client, server) = duplex(4096);
        let result = handle_connection(
            server,
            "dns.example.com".to_string(),
            peer(),
            &pipeline,
            Duration::from_millis(50),
        )
        .await;
        assert!(result.is_ok());
    }
}
