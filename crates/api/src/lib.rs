//! HTTP surface of the visa CMS.

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

/// The router with every route group and the shared middleware stack.
pub fn build_app(state: AppState) -> Router {
    let config = state.config();
    let body_limit = config.body_limit_bytes;
    let cors = middleware::cors::cors_layer(&config.cors_origins);

    // CORS needs a `Default` response body, so it sits inside the limit layer.
    let layers = ServiceBuilder::new()
        .layer(middleware::request_tracing::trace_layer())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(DefaultBodyLimit::disable());

    routes::build_router(state).layer(layers)
}
