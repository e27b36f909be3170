//! Template resolver.
//!
//! Templates are looked up by logical name (e.g. `ingress-tpl.yaml`) in two
//! directories, in a fixed order:
//! 1. the user override directory (`deploy/base/templates` in a project)
//! 2. the built-in directory shipped with the tool

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// Directories searched for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSearchPath {
    /// Checked first.
    pub override_dir: PathBuf,
    /// Fallback.
    pub builtin_dir: PathBuf,
}

impl TemplateSearchPath {
    pub fn new(override_dir: impl Into<PathBuf>, builtin_dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: override_dir.into(),
            builtin_dir: builtin_dir.into(),
        }
    }
}

/// Where a template was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateLocation {
    Override(PathBuf),
    Builtin(PathBuf),
}

impl TemplateLocation {
    pub fn path(&self) -> &Path {
        match self {
            TemplateLocation::Override(path) | TemplateLocation::Builtin(path) => path,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, TemplateLocation::Override(_))
    }
}

/// Template resolver.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    search_path: TemplateSearchPath,
}

impl TemplateResolver {
    /// Create a new template resolver.
    pub fn new(search_path: TemplateSearchPath) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &TemplateSearchPath {
        &self.search_path
    }

    /// Find which directory provides a template, without reading it.
    pub fn locate(&self, name: &str) -> Option<TemplateLocation> {
        let user = self.search_path.override_dir.join(name);
        if user.is_file() {
            return Some(TemplateLocation::Override(user));
        }

        let builtin = self.search_path.builtin_dir.join(name);
        if builtin.is_file() {
            return Some(TemplateLocation::Builtin(builtin));
        }

        None
    }

    /// Check whether a template exists in either directory.
    pub fn exists(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    /// Read a template's source text.
    pub fn resolve(&self, name: &str) -> TemplateResult<String> {
        let location = self
            .locate(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        debug!("Resolved template {} to {:?}", name, location);

        fs::read_to_string(location.path()).map_err(|source| TemplateError::ReadFailure {
            path: location.path().to_path_buf(),
            source,
        })
    }
}
