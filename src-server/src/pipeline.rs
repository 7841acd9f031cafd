//! Batch pipeline: uploads in, one zip archive out.
//!
//! Both uploads are staged in a fresh work area, the template is loaded, the
//! spreadsheet parsed, every row rendered and the results packed. The work
//! area is removed whether the batch succeeds or fails. Nothing is returned
//! unless every row rendered.

use std::path::Path;

use mail_merge::{MergeEngine, SpreadsheetParser};
use store::{BatchWorkspace, DocxTemplate};

use crate::error::AppError;

/// Accepted template extensions
pub const TEMPLATE_EXTENSIONS: &[&str] = &["docx"];

/// Accepted spreadsheet extensions
pub const TABLE_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Whether the file name ends in one of `extensions` (case-insensitive)
    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
            .unwrap_or(false)
    }

    /// The bare file name, without any client-supplied directories
    fn staged_name(&self, fallback: &str) -> String {
        let base = self.file_name.rsplit(['/', '\\']).next().unwrap_or_default();
        match base {
            "" | "." | ".." => fallback.to_owned(),
            name => name.to_owned(),
        }
    }
}

/// Result of a successful batch
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// The zip archive
    pub archive: Vec<u8>,
    /// Number of rendered documents in the archive
    pub documents: usize,
}

/// Run one batch synchronously. Call from a blocking thread.
pub fn run_batch(work_root: &Path, template: &Upload, table: &Upload) -> Result<BatchOutput, AppError> {
    if !template.has_extension(TEMPLATE_EXTENSIONS) {
        return Err(AppError::BadRequest(format!(
            "Template must be a .docx file, got \"{}\"",
            template.file_name
        )));
    }
    if !table.has_extension(TABLE_EXTENSIONS) {
        return Err(AppError::BadRequest(format!(
            "Data file must be an .xls or .xlsx file, got \"{}\"",
            table.file_name
        )));
    }

    let workspace = BatchWorkspace::create(work_root)?;
    let result = render_in(&workspace, template, table);
    workspace.close();
    result
}

fn render_in(workspace: &BatchWorkspace, template: &Upload, table: &Upload) -> Result<BatchOutput, AppError> {
    let template_path = workspace.stage(&template.staged_name("template.docx"), &template.bytes)?;
    let table_path = workspace.stage(&table.staged_name("data.xlsx"), &table.bytes)?;

    let template = DocxTemplate::open(&template_path)?;
    let data_source = SpreadsheetParser::new().parse_file(&table_path)?;
    tracing::info!(
        rows = data_source.record_count(),
        columns = data_source.column_count(),
        "Starting batch"
    );

    let documents = MergeEngine::default().generate(&template, &data_source)?;
    let archive = store::pack(&documents)?;
    tracing::info!(documents = documents.len(), size = archive.len(), "Batch packaged");

    Ok(BatchOutput {
        archive,
        documents: documents.len(),
    })
}
