//! Axum server setup and routing.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new().route("/health", get(api::health::health));

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.server.cors_origins))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes));

    Router::new()
        .route("/quantum", post(api::quantum::quantum))
        .route("/solve", post(api::solve::solve))
        .nest("/api", api_routes)
        .layer(layers)
        .with_state(state)
}

/// `origins` is a comma-separated list of allowed origins, or `"*"`.
fn build_cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.trim() == "*" {
        layer.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|o| o.trim().parse().ok())
            .collect();
        layer.allow_origin(allowed)
    }
}
