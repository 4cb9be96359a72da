//! Service config loader: optional strict YAML file, then environment.
//!
//! Resolved once at startup; handlers only ever read the result.

pub mod schema;

use std::fs;
use std::path::Path;

use tiny_core::error::{Result, TinyError};

pub use schema::ServiceConfig;

/// Greeting prefix override.
pub const ENV_WELCOME_PREFIX: &str = "WELCOME_PREFIX";
/// Listen address override.
pub const ENV_LISTEN: &str = "TINY_SERVICE_LISTEN";
/// Path of the YAML config file.
pub const ENV_CONFIG_PATH: &str = "TINY_SERVICE_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "tiny-service.yaml";

pub fn load_from_file(path: &str) -> Result<ServiceConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TinyError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg: ServiceConfig = serde_yaml::from_str(s)
        .map_err(|e| TinyError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from the process environment.
pub fn load() -> Result<ServiceConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Load using `lookup` in place of the process environment.
///
/// An explicit `TINY_SERVICE_CONFIG` must exist; the default path is optional.
pub fn load_with<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let cfg = match lookup(ENV_CONFIG_PATH) {
        Some(path) => load_from_file(&path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH)?,
        None => ServiceConfig::default(),
    };
    apply_env_with(cfg, lookup)
}

/// Overlay environment values on top of `cfg`.
pub fn apply_env_with<F>(mut cfg: ServiceConfig, lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(prefix) = lookup(ENV_WELCOME_PREFIX) {
        cfg.welcome_prefix = prefix;
    }
    if let Some(listen) = lookup(ENV_LISTEN) {
        cfg.listen = listen;
    }
    cfg.validate()?;
    Ok(cfg)
}
