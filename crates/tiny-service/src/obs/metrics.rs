//! HTTP request metrics.
//!
//! Two families are declared once per registry: a request counter labelled by
//! method and raw request path, and an unlabelled latency histogram in
//! seconds. The raw path keeps cardinality unbounded for parameterised
//! routes; every current route is static.

use std::time::Duration;

use tiny_core::error::Result;
use tiny_core::metrics::{Counter, Histogram, Registry, DEFAULT_BUCKETS};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

#[derive(Clone)]
pub struct HttpMetrics {
    requests: Counter,
    latency: Histogram,
}

impl HttpMetrics {
    /// Declare both families on `registry`.
    pub fn register(registry: &Registry) -> Result<Self> {
        let requests = registry.register_counter(REQUESTS_TOTAL, "Total HTTP requests", &["method", "endpoint"])?;
        let latency = registry.register_histogram(REQUEST_DURATION, "HTTP request latency", &DEFAULT_BUCKETS)?;
        Ok(Self { requests, latency })
    }

    /// Record one finished request.
    pub fn record(&self, method: &str, endpoint: &str, elapsed: Duration) {
        self.latency.observe(elapsed.as_secs_f64());
        // Arity is fixed at two above, so this only fails if the schema drifts.
        if let Err(e) = self.requests.increment(&[method, endpoint]) {
            tracing::warn!(error = %e, "request counter rejected labels");
        }
    }

    pub fn requests(&self) -> &Counter {
        &self.requests
    }

    pub fn latency(&self) -> &Histogram {
        &self.latency
    }
}
