//! Error types for DOCX template operations

use thiserror::Error;

/// Errors that can occur while loading, rendering, or packaging DOCX files
#[derive(Debug, Error)]
pub enum DocxError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Invalid DOCX structure
    #[error("Invalid DOCX structure: {0}")]
    InvalidStructure(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Template references a placeholder the render context does not provide
    #[error("Undefined placeholder: {{{{ {0} }}}}")]
    UndefinedPlaceholder(String),

    /// Template contains a `{{` without a closing `}}`
    #[error("Malformed placeholder: {0}")]
    MalformedPlaceholder(String),

    /// Two archive entries would share the same name
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// UTF-8 encoding error
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for DocxError {
    fn from(err: quick_xml::Error) -> Self {
        DocxError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocxError::XmlParse(format!("Attribute error: {}", err))
    }
}

/// Result type for DOCX operations
pub type DocxResult<T> = std::result::Result<T, DocxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_placeholder_message() {
        let err = DocxError::UndefinedPlaceholder("amount".to_string());
        assert_eq!(err.to_string(), "Undefined placeholder: {{ amount }}");
    }
}
