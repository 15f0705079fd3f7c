use anyhow::{anyhow, Result};
use homecrab::dhcp::DhcpServer;
use homecrab::dns::dot::{self, DotServer};
use homecrab::dns::Pipeline;
use homecrab::{doh, tls, Config, SharedConfig};
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("homecrab".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let lease_store = config.lease_store().await?;
    let dhcp = DhcpServer::new(config.dhcp.clone(), lease_store)?.shared();
    let pipeline = Arc::new(Pipeline::from_config(&config, dhcp.clone()));

    let mut servers: JoinSet<Result<()>> = JoinSet::new();

    tracing::info!("DNS listening on UDP {}", &config.dns_udp_bind_addr);
    tracing::info!("DNS listening on TCP {}", &config.dns_tcp_bind_addr);
    let dns_server = homecrab::dns::new(config.clone(), pipeline.clone()).await?;
    servers.spawn(async move { Ok(dns_server.block_until_done().await?) });

    tracing::info!("API listening on {}", &config.api_bind_addr);
    let api_server = homecrab::api::new(config.clone(), dhcp);
    servers.spawn(async move { Ok(api_server.await?) });

    let tls_config = &config.tls;
    if let (Some(addr), Some(cert_path), Some(key_path)) =
        (tls_config.dot_bind_addr, &tls_config.cert_path, &tls_config.key_path)
    {
        let acceptor = TlsAcceptor::from(tls::server_config(cert_path, key_path, &[tls::ALPN_DOT])?);
        let server = DotServer::new(acceptor, pipeline.clone(), config.dns_tcp_timeout);
        servers.spawn(dot::serve(addr, server));
    }

    if let Some(addr) = tls_config.doh_bind_addr {
        match (&tls_config.cert_path, &tls_config.key_path) {
            (Some(cert_path), Some(key_path)) => {
                let acceptor = TlsAcceptor::from(tls::server_config(cert_path, key_path, tls::ALPN_DOH)?);
                servers.spawn(doh::serve_tls(addr, acceptor, pipeline.clone(), config.api_timeout));
            }
            _ => {
                servers.spawn(doh::serve_plain(addr, pipeline.clone(), config.api_timeout));
            }
        }
    }

    // TODO(XXX): proper graceful shutdown.
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Some(res) = servers.join_next() => {
            res??;
            return Err(anyhow!("server exited unexpectedly"));
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homecrab=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}");
            Ok(Arc::new(config))
        }
    }
}
