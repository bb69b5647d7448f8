//! DOCX text extraction. A `.docx` file is a zip container; the body text
//! lives in `word/document.xml` as `<w:t>` runs grouped into `<w:p>`
//! paragraphs.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::errors::DocumentError;

const DOCUMENT_XML: &str = "word/document.xml";

pub fn extract_text(path: &Path) -> Result<String, DocumentError> {
    let file = File::open(path).map_err(|e| DocumentError::CorruptDocument(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| DocumentError::CorruptDocument(format!("not a valid docx container: {e}")))?;
    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| DocumentError::CorruptDocument(format!("missing {DOCUMENT_XML}: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::CorruptDocument(e.to_string()))?;
    plaintext_from_document_xml(&xml)
}

/// Streams the document XML, concatenating text runs. Paragraph ends become
/// newlines, explicit tabs and line breaks are kept, everything else
/// (styling, tables markup, section properties) is dropped.
fn plaintext_from_document_xml(xml: &str) -> Result<String, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| DocumentError::CorruptDocument(format!("bad XML text: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::CorruptDocument(format!(
                    "bad document XML: {e}"
                )))
            }
            Ok(_) => {}
        }
    }

    Ok(out)
}

/// Writes a minimal but structurally real `.docx` (zip + document.xml) for
/// loader and pipeline tests. An empty string in `paragraphs` produces an
/// empty paragraph.
#[cfg(test)]
pub(crate) fn write_minimal_docx(path: &Path, paragraphs: &[&str]) {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| {
            if p.is_empty() {
                "<w:p/>".to_string()
            } else {
                format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>")
            }
        })
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(DOCUMENT_XML, zip::write::FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap();
}
