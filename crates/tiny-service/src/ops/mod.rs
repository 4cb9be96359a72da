//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness / readiness
//! - `/metrics` : Prometheus text format
//! - fallback   : JSON 404

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tiny_core::error::TinyError;
use tiny_core::metrics::CONTENT_TYPE;

use crate::app_state::AppState;
use crate::error::HttpError;

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: f64,
}

pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: unix_timestamp(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.registry().export_text();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        body,
    )
        .into_response()
}

pub async fn not_found(uri: Uri) -> HttpError {
    HttpError(TinyError::NotFound(uri.path().to_string()))
}
