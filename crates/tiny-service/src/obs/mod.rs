//! In-process metrics for the service.
//!
//! HTTP request families and the standard `process_*` families live on a
//! `tiny_core::metrics::Registry` owned by `AppState` and are rendered by the
//! `/metrics` handler.

pub mod metrics;
pub mod process;

pub use metrics::HttpMetrics;
