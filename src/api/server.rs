use crate::api::routes;
use crate::config::SharedConfig;
use crate::dhcp::SharedDhcp;
use std::future::Future;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub dhcp: SharedDhcp,
}

pub fn new(config: SharedConfig, dhcp: SharedDhcp) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.api_bind_addr)
        .serve(routes::new(AppState { config, dhcp }).into_make_service())
}
