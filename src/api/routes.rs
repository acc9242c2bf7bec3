use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::state::AppState;

/// Root-level routes, outside the versioned API
pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

/// Routes mounted at `/api/v1`.
///
/// ```text
/// POST /devices/{device_id}/heartbeat  -> post_heartbeat
/// POST /devices/{device_id}/stats      -> post_upload_stats
/// GET  /devices/{device_id}/stats      -> get_device_stats
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/devices/{device_id}/heartbeat",
            post(handlers::post_heartbeat),
        )
        .route(
            "/devices/{device_id}/stats",
            post(handlers::post_upload_stats).get(handlers::get_device_stats),
        )
}
