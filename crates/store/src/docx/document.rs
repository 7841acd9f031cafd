//! Rendered output documents

use serde::{Deserialize, Serialize};

/// One rendered `.docx`, produced from a single data record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    /// 1-based position of the source record
    pub index: usize,
    /// Complete `.docx` package bytes
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    /// Create a rendered document for the record at `index` (1-based)
    pub fn new(index: usize, bytes: Vec<u8>) -> Self {
        Self { index, bytes }
    }

    /// Archive entry name, e.g. `record_3.docx`
    pub fn entry_name(&self) -> String {
        entry_name(self.index)
    }

    /// Size of the package in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the package is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Archive entry name for the record at `index` (1-based)
pub fn entry_name(index: usize) -> String {
    format!("record_{}.docx", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name() {
        assert_eq!(RenderedDocument::new(1, vec![1, 2]).entry_name(), "record_1.docx");
        assert_eq!(entry_name(42), "record_42.docx");
    }

    #[test]
    fn test_serialization_skips_bytes() {
        let doc = RenderedDocument::new(7, vec![0; 16]);
        assert_eq!(doc.len(), 16);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"index":7}"#);
    }
}
