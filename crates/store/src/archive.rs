//! Zip packaging of rendered documents
//!
//! All rendered documents of a batch are bundled into a single in-memory zip
//! archive, one entry per document named `record_<index>.docx`, in the order
//! they were produced.

use crate::docx::{DocxError, DocxResult, RenderedDocument};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// File name offered to the client for download
pub const ARCHIVE_FILE_NAME: &str = "word_files.zip";

/// MIME type of the archive
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Pack rendered documents into a zip archive, preserving their order.
///
/// Fails with [`DocxError::DuplicateEntry`] if two documents share an index.
pub fn pack(documents: &[RenderedDocument]) -> DocxResult<Vec<u8>> {
    let total: usize = documents.iter().map(RenderedDocument::len).sum();
    let mut zip = ZipWriter::new(Cursor::new(Vec::with_capacity(total)));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let mut seen = HashSet::with_capacity(documents.len());

    for document in documents {
        let name = document.entry_name();
        if !seen.insert(document.index) {
            return Err(DocxError::DuplicateEntry(name));
        }
        zip.start_file(name, options)?;
        zip.write_all(&document.bytes)?;
    }

    let bytes = zip.finish()?.into_inner();
    tracing::debug!(entries = documents.len(), size = bytes.len(), "Packed archive");
    Ok(bytes)
}

/// Entry names of an archive, in archive order
pub fn entry_names(archive: &[u8]) -> DocxResult<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(archive))?;
    Ok((0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Read;

    fn documents(count: usize) -> Vec<RenderedDocument> {
        (1..=count)
            .map(|i| RenderedDocument::new(i, format!("document {}", i).into_bytes()))
            .collect()
    }

    #[test]
    fn test_pack_names_and_order() {
        let archive = pack(&documents(3)).unwrap();
        assert_eq!(
            entry_names(&archive).unwrap(),
            vec!["record_1.docx", "record_2.docx", "record_3.docx"]
        );
    }

    #[test]
    fn test_pack_contents() {
        let archive = pack(&documents(2)).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(archive.as_slice())).unwrap();
        let mut contents = String::new();
        zip.by_name("record_2.docx").unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "document 2");
    }

    #[test]
    fn test_pack_empty() {
        let archive = pack(&[]).unwrap();
        assert!(entry_names(&archive).unwrap().is_empty());
    }

    #[test]
    fn test_pack_duplicate_index() {
        let docs = vec![
            RenderedDocument::new(1, vec![1]),
            RenderedDocument::new(1, vec![2]),
        ];
        assert!(matches!(pack(&docs), Err(DocxError::DuplicateEntry(ref n)) if n == "record_1.docx"));
    }

    #[test]
    fn test_archive_constants() {
        assert_eq!(ARCHIVE_FILE_NAME, "word_files.zip");
        assert_eq!(ARCHIVE_MIME_TYPE, "application/zip");
    }

    proptest! {
        #[test]
        fn prop_pack_has_one_entry_per_document(count in 0usize..40) {
            let archive = pack(&documents(count)).unwrap();
            let names = entry_names(&archive).unwrap();
            let expected: Vec<String> = (1..=count).map(|i| format!("record_{}.docx", i)).collect();
            prop_assert_eq!(names, expected);
        }
    }
}
