//! Error types for deploy generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deploy operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors that can occur while generating or scaffolding deploy files.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Template error: {0}")]
    Template(#[from] shipyard_templates::TemplateError),

    /// The built-in template tree is missing; the installation is broken.
    #[error("Scaffold source directory not found: {0}")]
    ScaffoldSourceMissing(PathBuf),

    #[error("Failed to update resource index {path}: {source}")]
    IndexUpdateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two commands in one batch map to the same manifest file.
    #[error("Manifest {file} is already generated for command '{first}'")]
    ResourceCollision { file: String, first: String },

    #[error("Project file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid project file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
