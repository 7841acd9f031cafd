//! Scoped work areas for batch runs
//!
//! Every batch gets its own uniquely named directory under a shared root.
//! The directory is removed when the [`BatchWorkspace`] is closed or dropped,
//! whichever path the batch took. Removal failures are logged and swallowed.

use crate::{Result, StoreError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every work-area directory name
pub const WORKSPACE_PREFIX: &str = "batch-";

/// A per-batch temporary directory
#[derive(Debug)]
pub struct BatchWorkspace {
    dir: Option<TempDir>,
}

impl BatchWorkspace {
    /// Create a fresh work area under `root`, creating `root` if needed
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir_in(root)?;
        tracing::debug!(path = %dir.path().display(), "Created batch workspace");
        Ok(Self { dir: Some(dir) })
    }

    /// Path of the work area
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Write an uploaded file into the work area and return its path.
    ///
    /// `name` must be a plain file name.
    pub fn stage(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = Path::new(name).file_name();
        if name.is_empty() || file_name.map(|f| f != name).unwrap_or(true) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let path = self.path().join(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Remove the work area now
    pub fn close(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed batch workspace"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove batch workspace"),
            }
        }
    }
}

impl Drop for BatchWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Remove work areas left behind by earlier runs.
///
/// Returns the number of directories removed. Failures are logged, never
/// returned.
pub fn sweep_stale(root: impl AsRef<Path>) -> usize {
    let root = root.as_ref();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            tracing::warn!(path = %root.display(), error = %e, "Failed to scan work directory");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let stale = path.is_dir()
            && entry.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX);
        if !stale {
            continue;
        }
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale workspace"),
        }
    }

    if removed > 0 {
        tracing::info!(removed, path = %root.display(), "Removed stale batch workspaces");
    }
    removed
}
