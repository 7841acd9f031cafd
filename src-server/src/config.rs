//! Server configuration.
//!
//! Read once at startup from `DOCX_BATCH_*` environment variables. Only the
//! two credential secrets are required; every other setting falls back to a
//! default when unset or unparsable.

use std::net::SocketAddr;
use std::path::PathBuf;

use access_gate::Credentials;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8501;

/// Default request body limit in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {primary} (or {fallback})")]
    MissingSecret {
        primary: &'static str,
        fallback: &'static str,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// The accepted email/password pair.
    pub credentials: Credentials,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Root directory for per-batch work areas.
    pub work_dir: PathBuf,
    /// Request body limit in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `DOCX_BATCH_EMAIL` / `EMAIL`: accepted email (required)
    /// - `DOCX_BATCH_PASSWORD` / `PASSWORD`: accepted password (required)
    /// - `DOCX_BATCH_BIND_ADDR`: full bind address (overrides `PORT`, default `127.0.0.1:8501`)
    /// - `PORT`: port to bind on `0.0.0.0`
    /// - `DOCX_BATCH_LOG_LEVEL`: log filter (default `info`)
    /// - `DOCX_BATCH_WORK_DIR`: work-area root (default `<tmp>/docx-batch`)
    /// - `DOCX_BATCH_MAX_UPLOAD_MB`: request body limit (default `50`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |primary: &'static str, fallback: &'static str| {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSecret { primary, fallback })
        };
        let email = secret("DOCX_BATCH_EMAIL", "EMAIL")?;
        let password = secret("DOCX_BATCH_PASSWORD", "PASSWORD")?;

        // Priority: DOCX_BATCH_BIND_ADDR > PORT > default
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));
        let bind_addr = if let Some(addr) = lookup("DOCX_BATCH_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = lookup("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(DEFAULT_PORT)))
        } else {
            default_addr
        };

        let log_level = lookup("DOCX_BATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let work_dir = lookup("DOCX_BATCH_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("docx-batch"));

        let max_upload_mb = lookup("DOCX_BATCH_MAX_UPLOAD_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|mb| *mb > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_MB);

        Ok(Self {
            bind_addr,
            credentials: Credentials::new(email, password),
            log_level,
            work_dir,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}
