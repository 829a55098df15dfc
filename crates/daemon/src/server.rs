//! Server setup

use crate::Result;
use crate::config::Settings;
use axum::http::Uri;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_scalar::{Scalar, Servable as _};
use warden_http::{AppState, HttpError};

/// Build the complete axum router with documentation at `/docs/`
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = warden_http::routes::router().split_for_parts();

    router
        .merge(Scalar::with_url("/docs/", api))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> HttpError {
    HttpError::NotFound(uri.path().to_string())
}

/// Start the HTTP server and run until `state.shutdown` is cancelled
pub async fn serve(settings: &Settings, state: AppState) -> Result<()> {
    let addr = settings.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let shutdown: CancellationToken = state.shutdown.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}
