//! API route definitions

use axum::routing::get;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Search routes, mounted both at the root and under `/api`
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/search", get(handlers::search))
        .route("/search/suggestions", get(handlers::suggestions))
        .route("/search/trending", get(handlers::trending))
        .route("/stats", get(handlers::stats))
        .with_state(state)
}
