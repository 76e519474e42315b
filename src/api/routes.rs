//! API Routes
//!
//! Configures the Axum router with all history service endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_add_handler, cache_clear_handler, cache_get_handler, cache_remove_handler,
    cache_set_handler, cache_update_handler, create_handler, delete_handler, health_handler,
    purge_handler, refresh_handler, session_handler, snapshot_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /history` - Current view (live or cached records, percentage, status)
/// - `POST /history` - Create a record
/// - `PUT /history/:id` - Update a record
/// - `DELETE /history/:id` - Delete a record
/// - `POST /history/refresh` - Re-fetch in the background
/// - `PUT /session` - Switch user and/or credential
/// - `GET|PUT /cache/:user_id` - Read or replace a cache entry
/// - `POST /cache/:user_id/records` - Append to a cache entry
/// - `PUT|DELETE /cache/:user_id/records/:record_id` - Replace or drop cached records
/// - `DELETE /cache` - Clear the whole cache
/// - `POST /purge` - Purge expired cache entries
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin so a local UI can call in
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/history", get(snapshot_handler).post(create_handler))
        .route("/history/refresh", post(refresh_handler))
        .route("/history/:id", put(update_handler).delete(delete_handler))
        .route("/session", put(session_handler))
        .route("/cache", delete(cache_clear_handler))
        .route("/cache/:user_id", get(cache_get_handler).put(cache_set_handler))
        .route("/cache/:user_id/records", post(cache_add_handler))
        .route(
            "/cache/:user_id/records/:record_id",
            put(cache_update_handler).delete(cache_remove_handler),
        )
        .route("/purge", post(purge_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
