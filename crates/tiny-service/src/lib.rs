//! tiny-service library entry.
//!
//! Wires config, the metrics registry, the request metrics middleware and the
//! HTTP handlers into one axum router. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
