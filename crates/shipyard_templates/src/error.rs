//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Neither the override nor the built-in directory holds the template.
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Whether this error came from persisting a rendered manifest.
    ///
    /// Batch generation keeps going past write failures and aborts on the rest.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, TemplateError::WriteFailure { .. })
    }
}
