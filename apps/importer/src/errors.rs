use std::path::PathBuf;

use thiserror::Error;

use crate::extraction::validator::FieldError;

/// Document-stage errors. Terminal for the single document that raised them;
/// they never abort a batch.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unsupported format: {0:?}")]
    UnsupportedFormat(String),

    #[error("corrupt document: {0}")]
    CorruptDocument(String),
}

/// Model-stage errors. `Auth` and `QuotaExceeded` are fatal for the whole
/// batch — every subsequent call would fail the same way.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model unavailable after {attempts} attempts: {last}")]
    Unavailable { attempts: u32, last: String },

    #[error("model authentication rejected: {0}")]
    Auth(String),

    #[error("model quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ModelError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ModelError::Auth(_) | ModelError::QuotaExceeded(_))
    }
}

/// Parse-stage error: the model response was not well-formed structured data
/// or is missing the required `name` key.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed model output: {0}")]
    MalformedModelOutput(String),
}

/// Storage sink errors. Reported per document but never invalidate an
/// already-extracted record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("storage unauthorized (status {0})")]
    Unauthorized(u16),

    #[error("storage rejected record: {0}")]
    Rejected(String),

    #[error("storage HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Any failure that ends a single document's pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation(Vec<FieldError>),
}

impl PipelineError {
    /// Pipeline stage that produced this error, for per-document diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Document(_) => "load",
            PipelineError::Model(_) => "model",
            PipelineError::Parse(_) => "parse",
            PipelineError::Validation(_) => "validate",
        }
    }

    /// True when this error must abort the remaining batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Model(m) if m.is_fatal())
    }
}
