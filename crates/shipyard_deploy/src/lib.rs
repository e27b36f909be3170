//! # shipyard_deploy
//!
//! Deployment manifest generation for Shipyard.
//!
//! Turns a handful of application facts (name, image, routes, background
//! commands) into Kubernetes manifests and keeps the kustomization resource
//! lists in sync.
//!
//! ## Features
//!
//! - Ingress, daemon and cronjob manifests from overridable templates
//! - Idempotent `resources:` list updates in kustomization files
//! - Non-destructive deploy tree scaffolding per environment
//! - Daemon/cronjob inference from command names when not declared
//!
//! ## Example
//!
//! ```rust,no_run
//! use shipyard_deploy::{GeneratorSettings, ManifestGenerator, ProjectFile};
//! use std::path::Path;
//!
//! let project = ProjectFile::load(Path::new("./shop/shipyard.yaml")).unwrap();
//! let generator = ManifestGenerator::new(GeneratorSettings::new("./shop"));
//!
//! generator.initialize(&["staging".to_string(), "prod".to_string()]).unwrap();
//! let ingress = generator.generate_ingress(project.config(), &project).unwrap();
//! let summary = generator.generate_all(project.config(), &project, &project);
//! assert!(summary.is_success());
//! ```

pub mod binder;
pub mod classifier;
pub mod error;
pub mod generator;
pub mod index;
pub mod models;
pub mod project;
pub mod scaffold;
pub mod sources;

pub use classifier::{classify, Classification};
pub use error::{DeployError, DeployResult};
pub use generator::{
    GeneratedManifests, GenerationFailure, GenerationSummary, GeneratorSettings, InitReport,
    ManifestGenerator, ResourceSummary, BUILTIN_TEMPLATES_DIR,
};
pub use index::{IndexPolicy, RegisterOutcome, ResourceIndex};
pub use models::{
    derive_resource_name, normalize_path, CommandKind, CommandMetadata, CommandRecord,
    DeploymentConfig, PathType, RouteDefinition, RouteRecord,
};
pub use project::ProjectFile;
pub use scaffold::{DirectoryScaffold, SeedReport};
pub use sources::{CommandMetadataSource, PathProvider, ProjectLocator, RouteSource};
