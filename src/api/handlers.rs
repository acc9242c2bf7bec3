//! Handlers for device telemetry ingestion and stats queries.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::error::RegistryError;
use crate::state::DeviceStats;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /devices/{device_id}/heartbeat`
#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub sent_at: DateTime<Utc>,
}

/// Body of `POST /devices/{device_id}/stats`
#[derive(Debug, Deserialize)]
pub struct UploadStatsRequest {
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    /// Upload duration in nanoseconds
    pub upload_time: i64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub devices: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/devices/{device_id}/heartbeat
pub async fn post_heartbeat(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    info!(device_id = %device_id, "Received heartbeat request");
    let Json(request) = payload.map_err(|rejection| {
        warn!(device_id = %device_id, error = %rejection, "Invalid heartbeat request");
        ApiError::from(rejection)
    })?;

    state
        .registry
        .ingest_heartbeat(&device_id, request.sent_at)
        .map_err(|err| unknown_device(err, "Heartbeat request from unknown device"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/devices/{device_id}/stats
pub async fn post_upload_stats(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    payload: Result<Json<UploadStatsRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    info!(device_id = %device_id, "Received upload stats request");
    let Json(request) = payload.map_err(|rejection| {
        warn!(device_id = %device_id, error = %rejection, "Invalid upload stats request");
        ApiError::from(rejection)
    })?;

    state
        .registry
        .ingest_upload_sample(&device_id, request.upload_time)
        .map_err(|err| unknown_device(err, "Upload stats request from unknown device"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/devices/{device_id}/stats
pub async fn get_device_stats(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> ApiResult<Json<DeviceStats>> {
    info!(device_id = %device_id, "Device stats requested");
    let stats = state
        .registry
        .compute_stats(&device_id)
        .map_err(|err| unknown_device(err, "Device stats requested but not found"))?;

    Ok(Json(stats))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        devices: state.registry.len(),
    })
}

fn unknown_device(err: RegistryError, message: &'static str) -> ApiError {
    let RegistryError::NotFound { device_id } = &err;
    warn!(device_id = %device_id, "{}", message);
    err.into()
}
