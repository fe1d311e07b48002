use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::request_id_middleware;

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Similar-content lookup
        .route("/similar/:content_type/:id", get(handlers::get_similar))
        // Cache administration
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/cache/:key", delete(handlers::clear_cache_entry))
        .route("/cache", delete(handlers::clear_cache_all))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
