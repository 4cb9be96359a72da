//! Public JSON endpoints: `/greet` and `/`.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::ops::unix_timestamp;

pub const SERVICE_NAME: &str = "tiny-service";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Paths advertised by `/`.
pub const ENDPOINTS: [&str; 3] = ["/healthz", "/greet", "/metrics"];

#[derive(Debug, Serialize)]
pub struct GreetResponse {
    pub message: String,
    pub timestamp: f64,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
    pub timestamp: f64,
}

/// `"<prefix>, <name>!"`, or `"<prefix>, anonymous user!"` for a missing or
/// empty name. Neither part is escaped.
pub fn greeting(prefix: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{prefix}, {name}!"),
        _ => format!("{prefix}, anonymous user!"),
    }
}

/// Query pairs are taken as a list so repeated or odd parameters never
/// reject the request; the last `name` wins.
pub async fn greet(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<GreetResponse> {
    let name = params
        .iter()
        .rev()
        .find(|(k, _)| k == "name")
        .map(|(_, v)| v.as_str());

    Json(GreetResponse {
        message: greeting(state.welcome_prefix(), name),
        timestamp: unix_timestamp(),
    })
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        endpoints: ENDPOINTS.to_vec(),
        timestamp: unix_timestamp(),
    })
}
