//! CLI command definitions.
//!
//! Each subcommand maps to one generator operation. Commands share a
//! [`Context`] built from the global flags.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use shipyard_deploy::{
    DeploymentConfig, GeneratorSettings, ManifestGenerator, PathProvider, ProjectFile,
    ProjectLocator, BUILTIN_TEMPLATES_DIR,
};

pub mod generate;
pub mod init;
pub mod list;

/// Shipyard - Kubernetes manifests from application metadata
#[derive(Parser)]
#[command(name = "shipyard")]
#[command(version, about = "Shipyard - Kubernetes manifests from application metadata")]
#[command(long_about = r#"
Shipyard renders Kubernetes manifests (ingress, daemon deployments, cronjobs)
from the routes and background commands declared in shipyard.yaml, and keeps
the kustomization resource lists in sync.

WORKFLOWS:
  init      → Seed deploy/base and one overlay per environment
  generate  → Render ingress, daemon and cronjob manifests
  list      → Show what generation would produce

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or project file
  4 - Template error
  6 - Broken installation (built-in templates missing)
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Project root (defaults to the nearest directory holding shipyard.yaml)
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,

    /// Built-in template tree
    #[arg(long, global = true, env = "SHIPYARD_TEMPLATES")]
    pub templates: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed the deploy tree
    Init(init::InitArgs),

    /// Generate deployment manifests
    Generate(generate::GenerateArgs),

    /// List the resources generation would produce
    List(list::ListArgs),
}

/// Settings shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    pub path: Option<PathBuf>,
    pub templates: PathBuf,
    pub quiet: bool,
}

/// A located and parsed project.
pub struct Project {
    pub root: PathBuf,
    pub file: ProjectFile,
    pub generator: ManifestGenerator,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            path: cli.path.clone(),
            templates: cli
                .templates
                .clone()
                .unwrap_or_else(|| PathBuf::from(BUILTIN_TEMPLATES_DIR)),
            quiet: cli.quiet,
        }
    }

    /// Project root from `--path`, or discovered from the working directory.
    pub fn project_root(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let current_dir = std::env::current_dir()?;
        Ok(ProjectLocator::new(current_dir).project_root()?)
    }

    pub fn settings(&self, root: PathBuf) -> GeneratorSettings {
        GeneratorSettings::new(root).with_builtin_templates(&self.templates)
    }

    /// Settings aligned with a project's deploy path and app identity.
    pub fn project_settings(&self, root: PathBuf, config: &DeploymentConfig) -> GeneratorSettings {
        GeneratorSettings::for_config(root, config).with_builtin_templates(&self.templates)
    }

    /// Locate and load the project file.
    pub fn open_project(&self) -> Result<Project> {
        let root = self.project_root()?;
        let file = ProjectFile::load(&root.join(ProjectLocator::PROJECT_FILE))
            .context("Failed to load project file")?;
        let generator = ManifestGenerator::new(self.project_settings(root.clone(), file.config()));

        Ok(Project {
            root,
            file,
            generator,
        })
    }
}
