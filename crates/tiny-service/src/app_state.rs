//! Shared application state.
//!
//! Built once in `main` and cloned into every request. The metrics registry is
//! owned here and passed explicitly; there is no global recorder.

use std::sync::Arc;

use tiny_core::error::Result;
use tiny_core::metrics::Registry;

use crate::config::ServiceConfig;
use crate::obs::{self, HttpMetrics};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    registry: Arc<Registry>,
    http: HttpMetrics,
}

impl AppState {
    /// Build application state with a fresh registry holding the HTTP and
    /// process families.
    /// Returns Result so main can handle registration errors gracefully.
    pub fn new(cfg: ServiceConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        let http = HttpMetrics::register(&registry)?;
        obs::process::register(&registry)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, registry, http }),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn welcome_prefix(&self) -> &str {
        &self.inner.cfg.welcome_prefix
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.inner.http
    }
}
