use crate::api::api_error::APIError;
use crate::api::model::{DhcpStatusResponse, StaticLeaseRequest};
use crate::api::server::AppState;
use crate::dhcp::{DhcpConfigUpdate, Lease, LeaseKind};
use crate::error::Error;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use time::OffsetDateTime;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/control/dhcp/status", get(dhcp_status))
        .route("/control/dhcp/interfaces", get(not_implemented))
        .route("/control/dhcp/set_config", post(set_config))
        .route("/control/dhcp/find_active_dhcp", post(not_implemented))
        .route("/control/dhcp/add_static_lease", post(add_static_lease))
        .route("/control/dhcp/remove_static_lease", post(remove_static_lease))
        .route("/control/dhcp/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

#[allow(clippy::unused_async)]
async fn not_implemented() -> APIError {
    Error::NotImplemented.into()
}

async fn dhcp_status(State(state): State<AppState>) -> Json<DhcpStatusResponse> {
    let dhcp = state.dhcp.read().await;
    let now = OffsetDateTime::now_utc();
    let conf = dhcp.config();
    Json(DhcpStatusResponse {
        enabled: conf.enabled,
        interface_name: conf.interface_name.clone(),
        v4: conf.v4.clone(),
        v6: conf.v6.clone(),
        leases: dhcp.leases(LeaseKind::Dynamic, now).await,
        static_leases: dhcp.leases(LeaseKind::Static, now).await,
    })
}

async fn set_config(
    State(state): State<AppState>,
    WithRejection(Json(update), _): WithRejection<Json<DhcpConfigUpdate>, APIError>,
) -> Result<(), APIError> {
    state
        .dhcp
        .write()
        .await
        .set_config(update)
        .map_err(Error::from)?;
    Ok(())
}

async fn add_static_lease(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<StaticLeaseRequest>, APIError>,
) -> Result<(), APIError> {
    let lease = Lease::try_from(req).map_err(Error::from)?;
    Ok(state.dhcp.write().await.add_static_lease(lease).await?)
}

async fn remove_static_lease(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<StaticLeaseRequest>, APIError>,
) -> Result<(), APIError> {
    let lease = Lease::try_from(req).map_err(Error::from)?;
    Ok(state.dhcp.write().await.remove_static_lease(&lease).await?)
}

async fn reset(State(state): State<AppState>) {
    state.dhcp.write().await.reset().await;
}
