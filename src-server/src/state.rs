//! Shared application state.
//!
//! A single [`AppState`] is built at startup and shared across all Axum
//! handlers via `Arc`.

use std::path::PathBuf;

use access_gate::AccessGate;

use crate::config::ServerConfig;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Credential check and live session tokens.
    pub gate: AccessGate,
    /// Root directory under which each batch gets its own work area.
    pub work_dir: PathBuf,
    /// Request body limit in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            gate: AccessGate::new(config.credentials.clone()),
            work_dir: config.work_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("work_dir", &self.work_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}
