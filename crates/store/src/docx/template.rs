//! DOCX templates with `{{ placeholder }}` substitution
//!
//! A template is an ordinary `.docx` package whose text contains placeholders
//! such as `{{ name }}`. Rendering replaces each placeholder with the value
//! of the same name from a [`RenderContext`] and writes a new package; every
//! part that cannot carry placeholders is copied through byte-for-byte.
//!
//! Word often splits what the author typed as one placeholder over several
//! runs (spell-check marks, revision ids, formatting changes). Substitution
//! therefore works on the concatenated text of all `<w:t>` nodes in a
//! paragraph rather than on individual nodes.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::reader::{DocxReader, XmlParser};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Placeholder name -> rendered text
pub type RenderContext = HashMap<String, String>;

const PLACEHOLDER_OPEN: &str = "{{";
const PLACEHOLDER_CLOSE: &str = "}}";

/// Whether a package part may contain placeholders
pub fn is_renderable_part(name: &str) -> bool {
    if name == "word/document.xml" || name == "word/footnotes.xml" || name == "word/endnotes.xml" {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && (file.starts_with("header") || file.starts_with("footer"))
        && file.ends_with(".xml")
}

/// A loaded DOCX template
#[derive(Debug, Clone)]
pub struct DocxTemplate {
    /// Original package bytes, used to copy non-renderable parts
    package: Vec<u8>,
    /// Renderable parts (part name -> XML)
    parts: BTreeMap<String, String>,
}

impl DocxTemplate {
    /// Load a template from package bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> DocxResult<Self> {
        let package = bytes.into();
        let mut reader = DocxReader::new(Cursor::new(package.as_slice()))?;

        if !reader.is_valid_docx() {
            return Err(DocxError::InvalidStructure(
                "package lacks [Content_Types].xml or word/document.xml".to_string(),
            ));
        }

        let mut parts = BTreeMap::new();
        for name in reader.file_names() {
            if is_renderable_part(&name) {
                let xml = reader.read_file_as_string(&name)?;
                parts.insert(name, xml);
            }
        }

        tracing::debug!(parts = parts.len(), size = package.len(), "Loaded DOCX template");

        Ok(Self { package, parts })
    }

    /// Load a template from a file
    pub fn open(path: impl AsRef<Path>) -> DocxResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Names of the parts that are rendered, in sorted order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Render the template with the given context into a new package
    pub fn render(&self, context: &RenderContext) -> DocxResult<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.package.as_slice()))?;
        let mut zip = ZipWriter::new(Cursor::new(Vec::with_capacity(self.package.len())));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            match self.parts.get(file.name()) {
                Some(xml) => {
                    let name = file.name().to_string();
                    drop(file);
                    let rendered = render_part(xml, context)?;
                    zip.start_file(name, options)?;
                    zip.write_all(rendered.as_bytes())?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Render one XML part, substituting placeholders paragraph by paragraph
pub fn render_part(xml: &str, context: &RenderContext) -> DocxResult<String> {
    let mut reader = XmlParser::from_string(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut paragraph: Vec<Event<'static>> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event()?;
        let boundary = match &event {
            Event::Eof => break,
            Event::Start(e) if is_paragraph(e.name().as_ref()) => Boundary::Open,
            Event::End(e) if is_paragraph(e.name().as_ref()) => Boundary::Close,
            _ => Boundary::None,
        };

        match boundary {
            Boundary::Open => depth += 1,
            Boundary::Close => depth = depth.saturating_sub(1),
            Boundary::None => {}
        }

        if depth == 0 && paragraph.is_empty() {
            writer.write_event(event)?;
            continue;
        }

        paragraph.push(event.into_owned());
        if depth == 0 {
            for rendered in render_paragraph(std::mem::take(&mut paragraph), context)? {
                writer.write_event(rendered)?;
            }
        }
    }

    if !paragraph.is_empty() {
        return Err(DocxError::XmlParse("unterminated paragraph".to_string()));
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

enum Boundary {
    Open,
    Close,
    None,
}

fn is_paragraph(name: &[u8]) -> bool {
    XmlParser::matches_element(name, "p")
}

fn is_text(name: &[u8]) -> bool {
    XmlParser::matches_element(name, "t")
}

/// Substitute placeholders across the text nodes of one paragraph
fn render_paragraph(
    mut events: Vec<Event<'static>>,
    context: &RenderContext,
) -> DocxResult<Vec<Event<'static>>> {
    let mut in_text = false;
    let mut text_starts = Vec::new();
    let mut text_slots = Vec::new();
    let mut texts = Vec::new();

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if is_text(e.name().as_ref()) => {
                in_text = true;
                text_starts.push(i);
            }
            Event::End(e) if is_text(e.name().as_ref()) => in_text = false,
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(|e| DocxError::XmlParse(e.to_string()))?;
                text_slots.push(i);
                texts.push(text.into_owned());
            }
            _ => {}
        }
    }

    let Some(rendered) = substitute(&texts, context)? else {
        return Ok(events);
    };

    for (slot, text) in text_slots.into_iter().zip(rendered) {
        events[slot] = Event::Text(BytesText::new(&text).into_owned());
    }
    for slot in text_starts {
        let preserved = match &events[slot] {
            Event::Start(start) => preserve_space(start),
            _ => continue,
        };
        events[slot] = Event::Start(preserved);
    }

    Ok(events)
}

/// Ensure a `<w:t>` keeps leading and trailing whitespace of substituted values
fn preserve_space(start: &BytesStart<'_>) -> BytesStart<'static> {
    let mut start = start.clone().into_owned();
    if XmlParser::get_attribute(&start, b"xml:space").is_none() {
        start.push_attribute(("xml:space", "preserve"));
    }
    start
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    /// Byte offset of `{{`
    start: usize,
    /// Byte offset just past `}}`
    end: usize,
    name: String,
}

fn find_placeholders(text: &str) -> DocxResult<Vec<Placeholder>> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(PLACEHOLDER_OPEN) {
        let start = cursor + offset;
        let body_start = start + PLACEHOLDER_OPEN.len();
        let snippet = || text[start..].chars().take(40).collect::<String>();

        let close = text[body_start..]
            .find(PLACEHOLDER_CLOSE)
            .ok_or_else(|| DocxError::MalformedPlaceholder(snippet()))?;
        let name = text[body_start..body_start + close].trim();
        if name.is_empty() {
            return Err(DocxError::MalformedPlaceholder(snippet()));
        }

        let end = body_start + close + PLACEHOLDER_CLOSE.len();
        found.push(Placeholder { start, end, name: name.to_string() });
        cursor = end;
    }

    Ok(found)
}

/// Rewrite a paragraph's text nodes with placeholders replaced.
///
/// Each replacement lands in the node where its placeholder starts; the rest
/// of the placeholder is removed from the nodes it spills into. Returns
/// `None` when the paragraph has no placeholders.
fn substitute(texts: &[String], context: &RenderContext) -> DocxResult<Option<Vec<String>>> {
    let joined = texts.concat();
    let placeholders = find_placeholders(&joined)?;
    if placeholders.is_empty() {
        return Ok(None);
    }

    let mut output = Vec::with_capacity(texts.len());
    let mut next = 0;
    let mut node_start = 0;

    for text in texts {
        let node_end = node_start + text.len();
        let mut rendered = String::with_capacity(text.len());
        let mut pos = node_start;

        while pos < node_end {
            while placeholders.get(next).is_some_and(|p| p.end <= pos) {
                next += 1;
            }
            match placeholders.get(next) {
                Some(p) if p.start < node_end => {
                    if p.start >= pos {
                        rendered.push_str(&joined[pos..p.start]);
                        let value = context
                            .get(&p.name)
                            .ok_or_else(|| DocxError::UndefinedPlaceholder(p.name.clone()))?;
                        rendered.push_str(value);
                    }
                    pos = p.end.min(node_end);
                }
                _ => {
                    rendered.push_str(&joined[pos..node_end]);
                    pos = node_end;
                }
            }
        }

        output.push(rendered);
        node_start = node_end;
    }

    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::{build_docx, build_docx_with_parts, document_xml, paragraph, read_part};

    fn context(pairs: &[(&str, &str)]) -> RenderContext {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn texts(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_renderable_parts() {
        assert!(is_renderable_part("word/document.xml"));
        assert!(is_renderable_part("word/header1.xml"));
        assert!(is_renderable_part("word/footer2.xml"));
        assert!(is_renderable_part("word/footnotes.xml"));
        assert!(!is_renderable_part("word/styles.xml"));
        assert!(!is_renderable_part("word/_rels/header1.xml.rels"));
        assert!(!is_renderable_part("docProps/core.xml"));
    }

    #[test]
    fn test_find_placeholders() {
        let found = find_placeholders("Dear {{ name }}, you owe {{amount}}.").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "name");
        assert_eq!(found[0].start, 5);
        assert_eq!(found[1].name, "amount");
    }

    #[test]
    fn test_find_placeholders_malformed() {
        assert!(matches!(find_placeholders("Hi {{ name"), Err(DocxError::MalformedPlaceholder(_))));
        assert!(matches!(find_placeholders("Hi {{  }}"), Err(DocxError::MalformedPlaceholder(_))));
    }

    #[test]
    fn test_substitute_single_node() {
        let out = substitute(&texts(&["Hello {{name}}!"]), &context(&[("name", "Alice")])).unwrap();
        assert_eq!(out, Some(texts(&["Hello Alice!"])));
    }

    #[test]
    fn test_substitute_without_placeholders() {
        assert_eq!(substitute(&texts(&["plain", " text"]), &context(&[])).unwrap(), None);
    }

    #[test]
    fn test_substitute_split_across_nodes() {
        let out = substitute(
            &texts(&["Total: {", "{ amo", "unt }", "} EUR"]),
            &context(&[("amount", "10")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(out.concat(), "Total: 10 EUR");
        assert_eq!(out[0], "Total: 10");
        assert_eq!(out[3], " EUR");
    }

    #[test]
    fn test_substitute_undefined() {
        let result = substitute(&texts(&["{{ missing }}"]), &context(&[("name", "x")]));
        assert!(matches!(result, Err(DocxError::UndefinedPlaceholder(ref n)) if n == "missing"));

        // Filters are not evaluated; the whole expression is the name
        let result = substitute(&texts(&["{{ name|upper }}"]), &context(&[("name", "x")]));
        assert!(matches!(result, Err(DocxError::UndefinedPlaceholder(ref n)) if n == "name|upper"));
    }

    #[test]
    fn test_render_part_escapes_and_preserves() {
        let xml = document_xml(&[
            paragraph(&["Name: {{name}}"]),
            paragraph(&["Static line"]),
        ]);
        let out = render_part(&xml, &context(&[("name", "Tom & <Jerry>")])).unwrap();
        assert!(out.contains("Name: Tom &amp; &lt;Jerry&gt;"));
        assert!(out.contains("Static line"));
        assert!(out.contains(r#"xml:space="preserve""#));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_render_part_split_runs() {
        let xml = document_xml(&[paragraph(&["{{ na", "me }} owes ", "{{amount}}"])]);
        let out = render_part(&xml, &context(&[("name", "Bob"), ("amount", "20")])).unwrap();
        assert!(out.contains("Bob"));
        assert!(out.contains(" owes "));
        assert!(out.contains("20"));
        assert!(!out.contains("{{"));
        assert!(!out.contains("me }}"));
    }

    #[test]
    fn test_render_round_trip() {
        let template_bytes = build_docx(&document_xml(&[paragraph(&["{{name}} / {{amount}}"])]));
        let template = DocxTemplate::from_bytes(template_bytes).unwrap();
        assert_eq!(template.part_names().collect::<Vec<_>>(), vec!["word/document.xml"]);

        let rendered = template.render(&context(&[("name", "Alice"), ("amount", "10")])).unwrap();
        let body = read_part(&rendered, "word/document.xml");
        assert!(body.contains("Alice / 10"));

        // Non-renderable parts survive untouched
        let content_types = read_part(&rendered, "[Content_Types].xml");
        assert!(content_types.contains("wordprocessingml.document.main+xml"));
    }

    #[test]
    fn test_render_headers_and_footers() {
        let header = format!(
            "<w:hdr xmlns:w=\"{}\">{}</w:hdr>",
            crate::docx::namespaces::W,
            paragraph(&["Prepared for {{name}}"])
        );
        let footer = format!(
            "<w:ftr xmlns:w=\"{}\">{}</w:ftr>",
            crate::docx::namespaces::W,
            paragraph(&["Ref {{ na", "me }}"])
        );
        let styles = "<w:styles>{{name}}</w:styles>";
        let package = build_docx_with_parts(
            &document_xml(&[paragraph(&["Body"])]),
            &[
                ("word/header1.xml", header.as_str()),
                ("word/footer1.xml", footer.as_str()),
                ("word/styles.xml", styles),
            ],
        );

        let template = DocxTemplate::from_bytes(package).unwrap();
        assert_eq!(
            template.part_names().collect::<Vec<_>>(),
            vec!["word/document.xml", "word/footer1.xml", "word/header1.xml"]
        );

        let rendered = template.render(&context(&[("name", "Alice")])).unwrap();
        assert!(read_part(&rendered, "word/header1.xml").contains("Prepared for Alice"));
        let footer = read_part(&rendered, "word/footer1.xml");
        assert!(footer.contains("Ref Alice"));
        assert!(!footer.contains("{{"));
        assert_eq!(read_part(&rendered, "word/styles.xml"), styles);
    }

    #[test]
    fn test_header_with_unknown_placeholder_fails() {
        let header = format!("<w:hdr xmlns:w=\"{}\">{}</w:hdr>", crate::docx::namespaces::W, paragraph(&["{{ city }}"]));
        let package = build_docx_with_parts(
            &document_xml(&[paragraph(&["{{name}}"])]),
            &[("word/header1.xml", header.as_str())],
        );
        let template = DocxTemplate::from_bytes(package).unwrap();
        let result = template.render(&context(&[("name", "Alice")]));
        assert!(matches!(result, Err(DocxError::UndefinedPlaceholder(ref n)) if n == "city"));
    }

    #[test]
    fn test_template_is_reusable() {
        let template = DocxTemplate::from_bytes(build_docx(&document_xml(&[paragraph(&["{{name}}"])]))).unwrap();
        let first = template.render(&context(&[("name", "Alice")])).unwrap();
        let second = template.render(&context(&[("name", "Bob")])).unwrap();
        assert!(read_part(&first, "word/document.xml").contains("Alice"));
        assert!(read_part(&second, "word/document.xml").contains("Bob"));
        assert!(!read_part(&second, "word/document.xml").contains("Alice"));
    }

    #[test]
    fn test_invalid_package() {
        assert!(matches!(DocxTemplate::from_bytes(b"not a zip".to_vec()), Err(DocxError::Zip(_))));
    }
}
