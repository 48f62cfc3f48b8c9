//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Overlay server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Initial filter query string, e.g. `state=TX&type=TOR`.
    pub query: String,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `OVERLAY_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `OVERLAY_QUERY` | Initial filter query string | (none) |
    /// | `OVERLAY_STATIC_DIR` | Static asset directory | `public` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("OVERLAY_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let query = env::var("OVERLAY_QUERY").unwrap_or_default();

        let static_dir = env::var("OVERLAY_STATIC_DIR")
            .unwrap_or_else(|_| "public".to_string())
            .into();

        Ok(Self {
            addr,
            query,
            static_dir,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid OVERLAY_ADDR format")]
    InvalidAddr,
}
