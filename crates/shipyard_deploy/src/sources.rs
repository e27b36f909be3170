//! Interfaces to the collaborators that feed generation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DeployError, DeployResult};
use crate::models::{CommandMetadata, RouteDefinition};

/// Supplies the application's HTTP routes.
#[cfg_attr(test, mockall::automock)]
pub trait RouteSource {
    fn routes(&self) -> Vec<RouteDefinition>;
}

/// Supplies background command metadata keyed by command name.
#[cfg_attr(test, mockall::automock)]
pub trait CommandMetadataSource {
    fn commands(&self) -> BTreeMap<String, CommandMetadata>;
}

/// Resolves the project root directory.
pub trait PathProvider {
    fn project_root(&self) -> DeployResult<PathBuf>;
}

/// Finds the project root by walking up to the nearest project file.
#[derive(Debug, Clone)]
pub struct ProjectLocator {
    start: PathBuf,
}

impl ProjectLocator {
    /// Name of the project file marking a project root.
    pub const PROJECT_FILE: &'static str = "shipyard.yaml";

    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Check if a project file exists directly in `path`.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().join(Self::PROJECT_FILE).is_file()
    }

    /// Walk up from `start_path` to the first directory holding a project file.
    pub fn find_root(start_path: impl AsRef<Path>) -> Option<PathBuf> {
        let mut current = start_path.as_ref().to_path_buf();
        loop {
            if Self::exists(&current) {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }
}

impl PathProvider for ProjectLocator {
    fn project_root(&self) -> DeployResult<PathBuf> {
        Self::find_root(&self.start)
            .ok_or_else(|| DeployError::ConfigNotFound(self.start.join(Self::PROJECT_FILE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_root_from_nested_dir() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(ProjectLocator::PROJECT_FILE), "").unwrap();

        let root = ProjectLocator::new(&nested).project_root().unwrap();
        assert_eq!(root, temp.path().to_path_buf());
    }

    #[test]
    fn test_no_project_file_in_tree() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert!(!ProjectLocator::exists(temp.path()));
        // Discovery may only stop above the temp tree, never inside it.
        let found = ProjectLocator::find_root(&nested);
        assert!(found.map_or(true, |root| !root.starts_with(temp.path())));
    }

    #[test]
    fn test_nearest_project_file_wins() {
        let temp = tempdir().unwrap();
        let inner = temp.path().join("services").join("api");
        fs::create_dir_all(inner.join("src")).unwrap();
        fs::write(temp.path().join(ProjectLocator::PROJECT_FILE), "").unwrap();
        fs::write(inner.join(ProjectLocator::PROJECT_FILE), "").unwrap();

        let root = ProjectLocator::new(inner.join("src")).project_root().unwrap();
        assert_eq!(root, inner);
    }
}
