//! DOCX Template Module
//!
//! Loads Microsoft Word `.docx` packages, renders their placeholders, and
//! represents the rendered output documents.
//!
//! ## Structure
//!
//! A DOCX file is a ZIP archive containing XML files:
//! - `[Content_Types].xml` - Content type definitions
//! - `_rels/.rels` - Root relationships
//! - `word/document.xml` - Main document content
//! - `word/header*.xml`, `word/footer*.xml` - Headers and footers
//! - `word/footnotes.xml`, `word/endnotes.xml` - Notes
//! - `word/media/` - Embedded images and media
//!
//! Only the document body, headers, footers and notes are rendered; all other
//! parts are copied unchanged.

mod error;
mod reader;
mod document;
mod template;

pub use error::{DocxError, DocxResult};
pub use reader::{DocxReader, XmlParser};
pub use document::{entry_name, RenderedDocument};
pub use template::{is_renderable_part, render_part, DocxTemplate, RenderContext};

/// XML namespaces used in DOCX files
pub mod namespaces {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Package relationships namespace
    pub const PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    /// Content types namespace
    pub const CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
}

/// Content types for DOCX parts
pub mod content_type_values {
    pub const DOCUMENT: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal DOCX packages for unit tests

    use super::{content_type_values, namespaces};
    use std::io::{Cursor, Read, Write};
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    /// A `<w:p>` with one run per text fragment
    pub fn paragraph(fragments: &[&str]) -> String {
        let runs: String = fragments
            .iter()
            .map(|t| format!("<w:r><w:rPr><w:b/></w:rPr><w:t>{}</w:t></w:r>", t))
            .collect();
        format!("<w:p><w:pPr><w:jc w:val=\"left\"/></w:pPr>{}</w:p>", runs)
    }

    pub fn document_xml(paragraphs: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:document xmlns:w=\"{}\"><w:body>{}<w:sectPr/></w:body></w:document>",
            namespaces::W,
            paragraphs.concat()
        )
    }

    pub fn build_docx(document_xml: &str) -> Vec<u8> {
        build_docx_with_parts(document_xml, &[])
    }

    /// A package with extra parts alongside the main document
    pub fn build_docx_with_parts(document_xml: &str, extra: &[(&str, &str)]) -> Vec<u8> {
        let content_types = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Types xmlns=\"{}\"><Default Extension=\"rels\" ContentType=\"{}\"/><Default Extension=\"xml\" ContentType=\"application/xml\"/><Override PartName=\"/word/document.xml\" ContentType=\"{}\"/></Types>",
            namespaces::CT,
            content_type_values::RELATIONSHIPS,
            content_type_values::DOCUMENT
        );
        let rels = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Relationships xmlns=\"{}\"><Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/></Relationships>",
            namespaces::PKG_REL
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in [
            ("[Content_Types].xml", content_types.as_str()),
            ("_rels/.rels", rels.as_str()),
            ("word/document.xml", document_xml),
        ] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        for (name, body) in extra {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn read_part(package: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        contents
    }
}
