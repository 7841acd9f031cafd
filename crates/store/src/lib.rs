//! Store - DOCX templates, archive packaging, and batch work areas
//!
//! This crate handles loading `.docx` templates and rendering their
//! placeholders, bundling rendered documents into a zip archive, and the
//! per-batch temporary directories uploads are staged in.

mod error;
mod workspace;
pub mod archive;
pub mod docx;

pub use error::*;
pub use workspace::{sweep_stale, BatchWorkspace, WORKSPACE_PREFIX};

// Re-export DOCX functionality
pub use docx::{DocxError, DocxResult, DocxTemplate, RenderContext, RenderedDocument};

// Re-export archive functionality
pub use archive::{pack, ARCHIVE_FILE_NAME, ARCHIVE_MIME_TYPE};
