//! Resource index maintenance.
//!
//! An index file (a kustomization) lists the manifests that belong to a layer:
//!
//! ```yaml
//! resources:
//!   - ingress.yaml
//!   - daemon-worker.yaml
//! ```
//!
//! Updates are textual. Only the entry line is inserted; every other byte of
//! the file is preserved.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{DeployError, DeployResult};

/// Line that opens the managed list.
pub const RESOURCES_HEADER: &str = "resources:";

/// What [`ResourceIndex::register`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    AlreadyPresent,
    /// The index file does not exist yet; nothing was created.
    IndexMissing,
    /// The file has no `resources:` line and the policy forbids adding one.
    HeaderMissing,
    /// A `resources:` section was appended along with the entry.
    HeaderCreated,
}

impl RegisterOutcome {
    /// Whether the file now lists the resource.
    pub fn is_registered(&self) -> bool {
        matches!(
            self,
            RegisterOutcome::Added | RegisterOutcome::AlreadyPresent | RegisterOutcome::HeaderCreated
        )
    }
}

/// How to treat index files without a `resources:` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexPolicy {
    pub create_missing_header: bool,
}

/// Updater for resource index files.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    policy: IndexPolicy,
}

impl ResourceIndex {
    pub fn new(policy: IndexPolicy) -> Self {
        Self { policy }
    }

    /// The list entry line for a resource file.
    pub fn entry_line(resource: &str) -> String {
        format!("  - {}", resource)
    }

    /// Add `resource` to the index at `index_path` unless already listed.
    pub fn register(&self, index_path: &Path, resource: &str) -> DeployResult<RegisterOutcome> {
        if !index_path.is_file() {
            warn!(
                "Resource index {:?} does not exist, skipping registration of {}",
                index_path, resource
            );
            return Ok(RegisterOutcome::IndexMissing);
        }

        let content = fs::read_to_string(index_path).map_err(|source| {
            DeployError::IndexUpdateFailed {
                path: index_path.to_path_buf(),
                source,
            }
        })?;

        let (patched, outcome) = self.patch(&content, resource);
        match outcome {
            RegisterOutcome::Added | RegisterOutcome::HeaderCreated => {
                replace_file(index_path, &patched)?;
                info!("Registered {} in {:?}", resource, index_path);
            }
            RegisterOutcome::AlreadyPresent => {
                debug!("{} already listed in {:?}", resource, index_path);
            }
            RegisterOutcome::HeaderMissing => {
                warn!(
                    "Resource index {:?} has no '{}' line, {} not registered",
                    index_path, RESOURCES_HEADER, resource
                );
            }
            RegisterOutcome::IndexMissing => {}
        }

        Ok(outcome)
    }

    /// Compute the patched index text.
    pub fn patch(&self, content: &str, resource: &str) -> (String, RegisterOutcome) {
        let entry = Self::entry_line(resource);

        if content
            .lines()
            .any(|line| line.trim_end_matches('\r') == entry)
        {
            return (content.to_string(), RegisterOutcome::AlreadyPresent);
        }

        let mut output = String::with_capacity(content.len() + entry.len() + 1);
        let mut inserted = false;
        for line in content.split_inclusive('\n') {
            output.push_str(line);
            if !inserted && line.trim() == RESOURCES_HEADER {
                if !line.ends_with('\n') {
                    output.push('\n');
                }
                output.push_str(&entry);
                output.push('\n');
                inserted = true;
            }
        }

        if inserted {
            return (output, RegisterOutcome::Added);
        }

        if self.policy.create_missing_header {
            let mut output = content.to_string();
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(RESOURCES_HEADER);
            output.push('\n');
            output.push_str(&entry);
            output.push('\n');
            return (output, RegisterOutcome::HeaderCreated);
        }

        (content.to_string(), RegisterOutcome::HeaderMissing)
    }
}

/// Write `content` to a temporary file beside `path` and rename it over `path`.
///
/// The replacement keeps the permissions of the file it replaces.
fn replace_file(path: &Path, content: &str) -> DeployResult<()> {
    let to_error = |source: std::io::Error| DeployError::IndexUpdateFailed {
        path: path.to_path_buf(),
        source,
    };

    let permissions = fs::metadata(path).map_err(to_error)?.permissions();
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(to_error)?;
    temp.as_file().set_permissions(permissions).map_err(to_error)?;
    temp.write_all(content.as_bytes()).map_err(to_error)?;
    temp.as_file().sync_all().map_err(to_error)?;
    temp.persist(path).map_err(|e| to_error(e.error))?;
    Ok(())
}
