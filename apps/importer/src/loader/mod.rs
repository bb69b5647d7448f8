//! Document Loader — turns a DOCX or PDF file into normalized plain text.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::DocumentError;

mod docx;
mod pdf;

#[cfg(test)]
pub(crate) use docx::write_minimal_docx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Format from a file extension, case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Docx => write!(f, "docx"),
            DocumentFormat::Pdf => write!(f, "pdf"),
        }
    }
}

/// Raw text of one input file. Ephemeral — consumed when the extraction
/// prompt is built.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub text: String,
}

/// Loads one resume file into plain text.
///
/// Fails with `FileNotFound` when the path does not resolve,
/// `UnsupportedFormat` for anything other than `.docx`/`.pdf`, and
/// `CorruptDocument` when the container cannot be parsed.
pub fn load(path: &Path) -> Result<SourceDocument, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::FileNotFound(path.to_path_buf()));
    }

    let ext = path.extension().and_then(OsStr::to_str).unwrap_or("");
    let format = DocumentFormat::from_extension(ext)
        .ok_or_else(|| DocumentError::UnsupportedFormat(ext.to_string()))?;

    let raw = match format {
        DocumentFormat::Docx => docx::extract_text(path)?,
        DocumentFormat::Pdf => pdf::extract_text(path)?,
    };

    let mut text = normalize_whitespace(&raw);
    if text.is_empty() {
        // Keep the pipeline going with a minimal prompt rather than failing;
        // the validator will reject the record if nothing comes back.
        let name = path.file_name().and_then(OsStr::to_str).unwrap_or("resume");
        text = format!("File: {name}\n[No text extracted]");
    }

    Ok(SourceDocument {
        path: path.to_path_buf(),
        format,
        text,
    })
}

/// Strips trailing spaces per line and collapses runs of blank lines into a
/// single blank line, so prompt size stays bounded by document content.
pub fn normalize_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_extension("DOCX"),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_extension("Pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(DocumentFormat::from_extension("txt"), None);
        assert_eq!(DocumentFormat::from_extension(""), None);
    }

    #[test]
    fn test_normalize_collapses_blank_line_runs() {
        let raw = "Jane Doe\n\n\n\nSkills\n\nPython\n";
        assert_eq!(normalize_whitespace(raw), "Jane Doe\n\nSkills\n\nPython");
    }

    #[test]
    fn test_normalize_strips_trailing_spaces() {
        let raw = "Jane Doe   \nEngineer\t\n";
        assert_eq!(normalize_whitespace(raw), "Jane Doe\nEngineer");
    }

    #[test]
    fn test_normalize_whitespace_only_input_is_empty() {
        assert_eq!(normalize_whitespace("  \n\n \t \n"), "");
    }

    #[test]
    fn test_load_missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.docx");
        match load(&path) {
            Err(DocumentError::FileNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_txt_is_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "plain text resume").unwrap();
        match load(&path) {
            Err(DocumentError::UnsupportedFormat(ext)) => assert_eq!(ext, "txt"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_load_extensionless_file_is_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume");
        std::fs::write(&path, "no extension").unwrap();
        match load(&path) {
            Err(DocumentError::UnsupportedFormat(ext)) => assert!(ext.is_empty()),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_load_garbage_docx_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        assert!(matches!(
            load(&path),
            Err(DocumentError::CorruptDocument(_))
        ));
    }

    #[test]
    fn test_load_docx_extracts_normalized_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        write_minimal_docx(&path, &["Jane Doe", "", "", "jane@x.com"]);
        let doc = load(&path).unwrap();
        assert_eq!(doc.format, DocumentFormat::Docx);
        assert_eq!(doc.text, "Jane Doe\n\njane@x.com");
    }

    #[test]
    fn test_load_empty_docx_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        write_minimal_docx(&path, &[]);
        let doc = load(&path).unwrap();
        assert_eq!(doc.text, "File: empty.docx\n[No text extracted]");
    }
}
