//! Axum router wiring.
//!
//! Every route, including the 404 fallback, runs inside the request metrics
//! layer.

use axum::{routing::get, Router};

use crate::{api, app_state::AppState, middleware, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/greet", get(api::greet))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .fallback(ops::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::http_metrics,
        ))
        .with_state(state)
}
