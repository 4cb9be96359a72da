use std::net::SocketAddr;

use serde::Deserialize;
use tiny_core::error::{Result, TinyError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Greeting prefix, used verbatim.
    #[serde(default = "default_welcome_prefix")]
    pub welcome_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            welcome_prefix: default_welcome_prefix(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| TinyError::Config(format!("listen must be a valid SocketAddr ({}): {e}", self.listen)))
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_welcome_prefix() -> String {
    "Hello".into()
}
