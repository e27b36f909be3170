//! The `shipyard.yaml` project file.
//!
//! ```yaml
//! app:
//!   name: shop
//!   image: registry.example.com/shop
//!   domain: shop.example.com
//! routes:
//!   - path: /users/{id}
//!     method: GET
//!     handler: UserController@show
//! commands:
//!   queue:work:
//!     description: Process the job queue
//!     args: ["--tries=3"]
//!   reports:daily:
//!     type: cronjob
//!     schedule: "0 6 * * *"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DeployError, DeployResult};
use crate::models::{CommandMetadata, DeploymentConfig, RouteDefinition};
use crate::sources::{CommandMetadataSource, RouteSource};

/// Parsed project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectFile {
    pub app: DeploymentConfig,
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandMetadata>,
}

impl ProjectFile {
    /// Load a project file from disk.
    pub fn load(path: &Path) -> DeployResult<Self> {
        if !path.is_file() {
            return Err(DeployError::ConfigNotFound(path.to_path_buf()));
        }

        debug!("Loading project file from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| DeployError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse project file text.
    pub fn parse(content: &str) -> DeployResult<Self> {
        let project: ProjectFile = serde_yaml::from_str(content)?;
        if project.app.app_name.trim().is_empty() {
            return Err(DeployError::InvalidConfig {
                path: ".".into(),
                message: "app.name must not be empty".to_string(),
            });
        }
        Ok(project)
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.app
    }
}

impl RouteSource for ProjectFile {
    fn routes(&self) -> Vec<RouteDefinition> {
        self.routes.clone()
    }
}

impl CommandMetadataSource for ProjectFile {
    fn commands(&self) -> BTreeMap<String, CommandMetadata> {
        self.commands.clone()
    }
}
