//! Mail Merge Execution Engine
//!
//! Renders one document per data source record from a shared template,
//! in record order, with an explicit per-row outcome.

use crate::data_source::{DataSource, Record};
use serde::{Deserialize, Serialize};
use store::{DocxError, DocxTemplate, RenderContext, RenderedDocument};

/// What to do when a record fails to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failed record and produce nothing
    #[default]
    AbortOnFirstError,
    /// Keep going and collect every failure next to the rendered documents
    CollectErrors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOptions {
    pub failure_policy: FailurePolicy,
    /// Trim surrounding whitespace from every inserted value
    pub trim_values: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { failure_policy: FailurePolicy::AbortOnFirstError, trim_values: true }
    }
}

impl MergeOptions {
    pub fn abort_on_first_error() -> Self { Self { failure_policy: FailurePolicy::AbortOnFirstError, ..Default::default() } }
    pub fn collect_errors() -> Self { Self { failure_policy: FailurePolicy::CollectErrors, ..Default::default() } }
    pub fn with_trim(mut self, trim: bool) -> Self { self.trim_values = trim; self }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    /// Every record rendered
    Completed,
    /// Some records rendered, others failed
    PartiallyCompleted,
    /// The run was aborted, or no record rendered
    Failed,
}

/// A failed record. `record_index` is the 1-based row position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("record {record_index}: {message}")]
pub struct MergeError {
    pub record_index: usize,
    pub message: String,
    /// The placeholder that could not be resolved, if that was the cause
    pub field_name: Option<String>,
}

impl MergeError {
    fn from_docx(record_index: usize, err: DocxError) -> Self {
        let field_name = match &err {
            DocxError::UndefinedPlaceholder(name) => Some(name.clone()),
            _ => None,
        };
        Self { record_index, message: err.to_string(), field_name }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub status: MergeStatus,
    pub total_records: usize,
    pub documents: Vec<RenderedDocument>,
    pub errors: Vec<MergeError>,
    pub summary: String,
}

impl MergeResult {
    fn new(total_records: usize) -> Self {
        Self { status: MergeStatus::Completed, total_records, documents: Vec::new(), errors: Vec::new(), summary: String::new() }
    }

    pub fn is_success(&self) -> bool { self.status == MergeStatus::Completed && self.errors.is_empty() }

    /// The rendered documents, or the first failure
    pub fn into_documents(self) -> Result<Vec<RenderedDocument>, MergeError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.documents),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    options: MergeOptions,
}

impl MergeEngine {
    pub fn new(options: MergeOptions) -> Self { Self { options } }

    pub fn options(&self) -> &MergeOptions { &self.options }

    /// Render one document per record, stopping at the first failure.
    ///
    /// Documents are indexed 1..=N in record order. A source without
    /// records yields an empty vector.
    pub fn generate(&self, template: &DocxTemplate, data_source: &DataSource) -> Result<Vec<RenderedDocument>, MergeError> {
        let engine = MergeEngine::new(MergeOptions { failure_policy: FailurePolicy::AbortOnFirstError, ..self.options.clone() });
        engine.execute(template, data_source).into_documents()
    }

    /// Render every record under the configured failure policy
    pub fn execute(&self, template: &DocxTemplate, data_source: &DataSource) -> MergeResult {
        let mut result = MergeResult::new(data_source.record_count());

        for (position, record) in data_source.records.iter().enumerate() {
            let index = position + 1;
            match self.render_record(template, record, index) {
                Ok(document) => result.documents.push(document),
                Err(err) => {
                    tracing::warn!(record = index, error = %err.message, "Record failed to render");
                    result.errors.push(err);
                    if self.options.failure_policy == FailurePolicy::AbortOnFirstError {
                        break;
                    }
                }
            }
        }

        result.status = if result.errors.is_empty() {
            MergeStatus::Completed
        } else if result.documents.is_empty() || self.options.failure_policy == FailurePolicy::AbortOnFirstError {
            MergeStatus::Failed
        } else {
            MergeStatus::PartiallyCompleted
        };
        result.summary = format!("Rendered {} of {} records ({} errors)",
            result.documents.len(), result.total_records, result.errors.len());
        tracing::info!(
            source = %data_source.id,
            rendered = result.documents.len(),
            failed = result.errors.len(),
            status = ?result.status,
            "Merge finished"
        );
        result
    }

    /// Render a single record as document number `index`
    pub fn render_record(&self, template: &DocxTemplate, record: &Record, index: usize) -> Result<RenderedDocument, MergeError> {
        let context = record_context(record, self.options.trim_values);
        let bytes = template.render(&context).map_err(|e| MergeError::from_docx(index, e))?;
        tracing::debug!(record = index, bytes = bytes.len(), "Rendered record");
        Ok(RenderedDocument::new(index, bytes))
    }
}

/// Map every column of a record to its display text
pub fn record_context(record: &Record, trim_values: bool) -> RenderContext {
    record
        .iter()
        .map(|(name, value)| {
            let text = value.to_string_value();
            let text = if trim_values { text.trim().to_string() } else { text };
            (name.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{ColumnDef, DataType, Value};
    use std::io::{Cursor, Read, Write};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn template(body: &str) -> DocxTemplate {
        let document = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><w:document xmlns:w=\"{}\"><w:body>{}</w:body></w:document>",
            W_NS, body
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in [
            ("[Content_Types].xml", "<?xml version=\"1.0\"?><Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"/>"),
            ("word/document.xml", document.as_str()),
        ] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        DocxTemplate::from_bytes(zip.finish().unwrap().into_inner()).unwrap()
    }

    fn letter() -> DocxTemplate {
        template("<w:p><w:r><w:t>Dear {{ name }}, you owe {{amount}}.</w:t></w:r></w:p>")
    }

    fn document_text(doc: &RenderedDocument) -> String {
        let mut archive = ZipArchive::new(Cursor::new(&doc.bytes)).unwrap();
        let mut xml = String::new();
        archive.by_name("word/document.xml").unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    fn contacts(rows: &[(&str, Option<f64>)]) -> DataSource {
        let mut ds = DataSource::inline("contacts");
        ds.add_column(ColumnDef::new("name", DataType::Text));
        ds.add_column(ColumnDef::new("amount", DataType::Number));
        for (name, amount) in rows {
            let mut record = Record::new();
            record.insert("name".into(), Value::from(*name));
            if let Some(amount) = amount {
                record.insert("amount".into(), Value::Number(*amount));
            }
            ds.add_record(record);
        }
        ds
    }

    #[test]
    fn test_generate_one_document_per_record() {
        let docs = MergeEngine::default()
            .generate(&letter(), &contacts(&[("Alice", Some(10.0)), ("Bob", Some(20.0))]))
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].index, 1);
        assert_eq!(docs[1].entry_name(), "record_2.docx");
        assert!(document_text(&docs[0]).contains("Dear Alice, you owe 10."));
        assert!(document_text(&docs[1]).contains("Dear Bob, you owe 20."));
    }

    #[test]
    fn test_generate_empty_source() {
        let docs = MergeEngine::default().generate(&letter(), &contacts(&[])).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_generate_aborts_on_missing_column() {
        let err = MergeEngine::default()
            .generate(&letter(), &contacts(&[("Alice", Some(1.0)), ("Bob", None), ("Carol", None)]))
            .unwrap_err();

        assert_eq!(err.record_index, 2);
        assert_eq!(err.field_name.as_deref(), Some("amount"));
        assert!(err.to_string().starts_with("record 2:"));
    }

    #[test]
    fn test_generate_ignores_collect_policy() {
        let engine = MergeEngine::new(MergeOptions::collect_errors());
        let result = engine.generate(&letter(), &contacts(&[("Alice", None), ("Bob", Some(2.0))]));
        assert_eq!(result.unwrap_err().record_index, 1);
    }

    #[test]
    fn test_execute_abort_stops_at_first_failure() {
        let result = MergeEngine::default()
            .execute(&letter(), &contacts(&[("Alice", Some(1.0)), ("Bob", None), ("Carol", None)]));

        assert_eq!(result.status, MergeStatus::Failed);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.total_records, 3);
        assert!(!result.is_success());
    }

    #[test]
    fn test_execute_collects_errors() {
        let result = MergeEngine::new(MergeOptions::collect_errors())
            .execute(&letter(), &contacts(&[("Alice", Some(1.0)), ("Bob", None), ("Carol", Some(3.0))]));

        assert_eq!(result.status, MergeStatus::PartiallyCompleted);
        assert_eq!(result.documents.iter().map(|d| d.index).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(result.errors[0].record_index, 2);
        assert_eq!(result.summary, "Rendered 2 of 3 records (1 errors)");
    }

    #[test]
    fn test_execute_all_failed() {
        let result = MergeEngine::new(MergeOptions::collect_errors())
            .execute(&letter(), &contacts(&[("Alice", None), ("Bob", None)]));
        assert_eq!(result.status, MergeStatus::Failed);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_execute_ignores_extra_columns() {
        let mut ds = contacts(&[("Alice", Some(5.0))]);
        ds.records[0].insert("unused".into(), Value::from("x"));
        let result = MergeEngine::default().execute(&letter(), &ds);
        assert!(result.is_success());
    }

    #[test]
    fn test_record_context_display() {
        let mut record = Record::new();
        record.insert("name".into(), Value::from("  Alice  "));
        record.insert("amount".into(), Value::Number(10.5));
        record.insert("note".into(), Value::Null);

        let trimmed = record_context(&record, true);
        assert_eq!(trimmed["name"], "Alice");
        assert_eq!(trimmed["amount"], "10.5");
        assert_eq!(trimmed["note"], "");

        let raw = record_context(&record, false);
        assert_eq!(raw["name"], "  Alice  ");
    }

    #[test]
    fn test_merge_options_defaults() {
        let opts = MergeOptions::default();
        assert_eq!(opts.failure_policy, FailurePolicy::AbortOnFirstError);
        assert!(opts.trim_values);
        assert!(!MergeOptions::collect_errors().with_trim(false).trim_values);
    }

    #[test]
    fn test_merge_status_serialization() {
        assert_eq!(serde_json::to_string(&MergeStatus::PartiallyCompleted).unwrap(), "\"partially_completed\"");
        assert_eq!(serde_json::to_string(&FailurePolicy::CollectErrors).unwrap(), "\"collect_errors\"");
    }
}
