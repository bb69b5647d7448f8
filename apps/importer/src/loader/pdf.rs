//! PDF text extraction via `pdf-extract`.

use std::path::Path;

use crate::errors::DocumentError;

pub fn extract_text(path: &Path) -> Result<String, DocumentError> {
    pdf_extract::extract_text(path)
        .map_err(|e| DocumentError::CorruptDocument(format!("pdf extraction failed: {e}")))
}
