pub mod error;
pub mod routes;
pub mod state;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the axum Router for the response-tracking endpoint.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let enable_cors = app_state.enable_cors;

    let router = Router::new()
        .route(
            "/api/responses",
            get(routes::responses::record_response)
                .options(routes::responses::preflight)
                .fallback(routes::responses::method_not_allowed),
        )
        .with_state(app_state);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
        router.layer(cors)
    } else {
        router
    }
}

/// Start the response-tracking server.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    serve_on(app_state, listener).await
}

/// Start the server on a pre-bound listener, so the caller can read the
/// actual port when binding to port 0.
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("response endpoint listening on http://localhost:{actual_port}/api/responses");

    axum::serve(listener, app).await?;
    Ok(())
}
