//! Token regeneration route

use crate::{error::HttpError, state::AppState, types::BaseResponse};
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::instrument;
use utoipa_axum::{router::OpenApiRouter, routes};
use warden_core::TokenProvider;


/// Regenerate the secret store token of one entity
///
/// Runs the configured token provider once for `entityId`. When no provider is
/// configured the call is a successful no-op.
#[utoipa::path(
    put,
    path = "/api/v3/token/entityId/{entityId}",
    params(
        ("entityId" = String, Path, description = "Secret store entity whose token is regenerated")
    ),
    responses(
        (status = 200, description = "Token regenerated, or no provider configured", body = BaseResponse),
        (status = 400, description = "Invalid entity id", body = BaseResponse),
        (status = 500, description = "Token provider failed", body = BaseResponse),
        (status = 503, description = "Server is shutting down", body = BaseResponse)
    ),
    tag = "token"
)]
#[instrument(name = "regenerate_token", skip(app_state))]
pub async fn regenerate_token(
    State(app_state): State<AppState>,
    Path(entity_id): Path<String>,
) -> Result<Json<BaseResponse>, HttpError> {
    if entity_id.trim().is_empty() {
        return Err(HttpError::BadRequest("entity id must not be empty".to_string()));
    }

    let secret_store = app_state.secret_store.as_ref();
    if secret_store.token_provider.is_empty() {
        info!("no token provider configured");
        return Ok(Json(BaseResponse::ok()));
    }

    if app_state.shutdown.is_cancelled() {
        return Err(HttpError::ServiceUnavailable(
            "server is shutting down".to_string(),
        ));
    }

    // Cancelled when this request completes or its future is dropped
    let cancel = app_state.shutdown.child_token();
    let _request_guard = cancel.clone().drop_guard();

    let mut provider = TokenProvider::new(cancel, app_state.runner.clone());

    if let Err(err) = provider.set_configuration(secret_store) {
        error!("failed to configure token provider: {}", err);
        return Err(err.into());
    }

    if let Err(err) = provider.launch_regen_token(&entity_id).await {
        error!("failed to regenerate token for entity {}: {}", entity_id, err);
        return Err(err.into());
    }

    Ok(Json(BaseResponse::ok()))
}

/// Add token routes to router
pub fn add_routes(router: OpenApiRouter<AppState>) -> OpenApiRouter<AppState> {
    router.routes(routes!(regenerate_token))
}
