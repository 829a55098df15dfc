//! Ping handler

use crate::{
    state::AppState,
    types::{API_VERSION, PingResponse},
};
use axum::{extract::State, response::Json};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/v3/ping",
    responses(
        (status = 200, description = "Service is reachable", body = PingResponse)
    ),
    tag = "system"
)]
pub async fn ping(State(app_state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        api_version: API_VERSION.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        service_name: app_state.service_name.clone(),
    })
}

/// Add ping routes to router
pub fn add_routes(router: OpenApiRouter<AppState>) -> OpenApiRouter<AppState> {
    router.routes(routes!(ping))
}
