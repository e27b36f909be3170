//! Deploy tree scaffolding.
//!
//! Seeding copies a built-in template tree into a project without touching
//! anything the user already has.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{DeployError, DeployResult};

/// What a seeding run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created_dirs: Vec<PathBuf>,
    pub copied_files: Vec<PathBuf>,
    /// Files left alone because the target already had them.
    pub skipped_files: Vec<PathBuf>,
}

/// Non-destructive recursive directory copy.
#[derive(Debug, Clone, Default)]
pub struct DirectoryScaffold;

impl DirectoryScaffold {
    pub fn new() -> Self {
        Self
    }

    /// Copy `source` into `target`, creating missing directories and copying
    /// only files that do not exist yet.
    pub fn seed(&self, source: &Path, target: &Path) -> DeployResult<SeedReport> {
        if !source.is_dir() {
            return Err(DeployError::ScaffoldSourceMissing(source.to_path_buf()));
        }

        info!("Seeding {:?} from {:?}", target, source);

        let mut report = SeedReport::default();
        if !target.exists() {
            fs::create_dir_all(target)?;
            report.created_dirs.push(target.to_path_buf());
        }

        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            let destination = target.join(relative);

            if entry.file_type().is_dir() {
                if !destination.exists() {
                    fs::create_dir_all(&destination)?;
                    report.created_dirs.push(destination);
                }
            } else if destination.exists() {
                debug!("Keeping existing {:?}", destination);
                report.skipped_files.push(destination);
            } else {
                if let Some(parent) = destination.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &destination)?;
                debug!("Copied {:?}", relative);
                report.copied_files.push(destination);
            }
        }

        info!(
            "Seeded {} files ({} kept)",
            report.copied_files.len(),
            report.skipped_files.len()
        );
        Ok(report)
    }
}
