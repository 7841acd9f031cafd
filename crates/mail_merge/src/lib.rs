//! Mail Merge
//!
//! This crate turns a spreadsheet into an ordered list of records and
//! renders one document per record from a `.docx` template.
//!
//! # Features
//!
//! - XLSX/XLSM/XLS/XLSB/ODS parsing with sheet selection and cell range support
//! - Automatic data type detection
//! - Batch rendering with an explicit per-record outcome
//!
//! # Example
//!
//! ```rust
//! use mail_merge::{create_inline_source, DataType, MergeEngine, Value};
//!
//! let source = create_inline_source(
//!     "contacts",
//!     vec![("name", DataType::Text)],
//!     vec![vec![("name", Value::from("Alice"))]],
//! );
//! assert_eq!(source.record_count(), 1);
//!
//! // let template = store::DocxTemplate::open("letter.docx")?;
//! // let documents = MergeEngine::default().generate(&template, &source)?;
//! # let _ = MergeEngine::default();
//! ```

mod data_source;
mod error;
mod spreadsheet_parser;
pub mod merge_engine;

use std::path::Path;

// Re-export main types
pub use data_source::{ColumnDef, DataSource, DataSourceType, DataType, Record, Value};
pub use error::{MailMergeError, Result};
pub use spreadsheet_parser::{
    get_sheet_names, get_sheet_names_from_bytes, is_spreadsheet_file, CellRange, SheetSelector,
    SpreadsheetConfig, SpreadsheetParser, SPREADSHEET_EXTENSIONS,
};
pub use merge_engine::{record_context, FailurePolicy, MergeEngine, MergeError, MergeOptions, MergeResult, MergeStatus};

/// Load a data source from a file, checking the extension first
pub fn load_from_file(path: impl AsRef<Path>) -> Result<DataSource> {
    let path = path.as_ref();
    let name = path.to_string_lossy();

    if is_spreadsheet_file(&name) {
        SpreadsheetParser::new().parse_file(path)
    } else {
        Err(MailMergeError::UnsupportedFormat(
            format!("Unknown file extension for: {}", name)
        ))
    }
}

/// Load a data source from uploaded bytes, using `file_name` for the
/// extension check and the source ID
pub fn load_from_bytes(data: &[u8], file_name: &str) -> Result<DataSource> {
    if !is_spreadsheet_file(file_name) {
        return Err(MailMergeError::UnsupportedFormat(
            format!("Unknown file extension for: {}", file_name)
        ));
    }

    let id = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spreadsheet");
    SpreadsheetParser::new().parse_bytes(data, id)
}

/// Create an inline data source from records
pub fn create_inline_source(id: &str, columns: Vec<(&str, DataType)>, records: Vec<Vec<(&str, Value)>>) -> DataSource {
    let mut ds = DataSource::inline(id);

    for (name, data_type) in columns {
        ds.add_column(ColumnDef::new(name, data_type));
    }

    for record_data in records {
        let mut record = Record::new();
        for (key, value) in record_data {
            record.insert(key.to_string(), value);
        }
        ds.add_record(record);
    }

    ds
}
