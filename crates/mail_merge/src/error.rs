//! Error types for mail merge operations

use thiserror::Error;

/// Errors that can occur while loading mail merge data
#[derive(Debug, Error)]
pub enum MailMergeError {
    /// Data source is unusable
    #[error("Data source is empty: {0}")]
    EmptyDataSource(String),

    /// Duplicate column names
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Error reading a workbook
    #[error("Spreadsheet parse error: {0}")]
    SpreadsheetParse(String),
}

/// Result type for mail merge operations
pub type Result<T> = std::result::Result<T, MailMergeError>;
