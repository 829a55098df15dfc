//! API route definitions
use crate::state::AppState;
use crate::types::{BaseResponse, PingResponse};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

pub mod health;
pub mod token;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(BaseResponse, PingResponse)
    ),
    tags(
        (name = "token", description = "Secret store token lifecycle"),
        (name = "system", description = "Service liveness"),
    ),
)]
struct ApiDoc;

/// Router with every warden route registered
pub fn router() -> OpenApiRouter<AppState> {
    let router = OpenApiRouter::with_openapi(ApiDoc::openapi());
    let router = health::add_routes(router);
    token::add_routes(router)
}
