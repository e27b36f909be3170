//! Deployment domain records.
//!
//! These are value objects built per generation call from the project file and
//! the route/command sources, then handed to the binder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classifier;

/// Resource quota keys with their default values.
pub const DEFAULT_RESOURCES: [(&str, &str); 4] = [
    ("MEMORY_REQUEST", "128Mi"),
    ("MEMORY_LIMIT", "512Mi"),
    ("CPU_REQUEST", "100m"),
    ("CPU_LIMIT", "500m"),
];

/// Port every generated service listens on.
pub const SERVICE_PORT: u16 = 80;

/// Merge quota overrides over [`DEFAULT_RESOURCES`]. Unknown keys are ignored.
pub fn merge_resources(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    DEFAULT_RESOURCES
        .iter()
        .map(|(key, default)| {
            let value = overrides
                .get(*key)
                .cloned()
                .unwrap_or_else(|| default.to_string());
            (key.to_string(), value)
        })
        .collect()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_env_name() -> String {
    "dev".to_string()
}

fn default_replicas() -> u32 {
    1
}

fn default_deploy_path() -> PathBuf {
    PathBuf::from("deploy")
}

/// Application-level deployment facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    #[serde(rename = "name")]
    pub app_name: String,
    #[serde(rename = "image")]
    pub image_name: String,
    #[serde(default = "default_image_tag")]
    pub image_tag: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_env_name")]
    pub env_name: String,
    #[serde(default, rename = "env")]
    pub env_vars: IndexMap<String, String>,
    #[serde(default, rename = "resources")]
    pub resource_overrides: BTreeMap<String, String>,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default = "default_deploy_path")]
    pub deploy_path: PathBuf,
}

impl DeploymentConfig {
    pub fn new(app_name: impl Into<String>, image_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            image_name: image_name.into(),
            image_tag: default_image_tag(),
            domain: String::new(),
            namespace: default_namespace(),
            env_name: default_env_name(),
            env_vars: IndexMap::new(),
            resource_overrides: BTreeMap::new(),
            replicas: default_replicas(),
            deploy_path: default_deploy_path(),
        }
    }

    pub fn with_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image_tag = tag.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_environment(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = env_name.into();
        self
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_resource(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_deploy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.deploy_path = path.into();
        self
    }

    pub fn service_name(&self) -> String {
        format!("{}-service", self.app_name)
    }

    pub fn merged_resources(&self) -> BTreeMap<String, String> {
        merge_resources(&self.resource_overrides)
    }
}

/// Ingress path match type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathType {
    #[default]
    Prefix,
    Exact,
    ImplementationSpecific,
}

impl PathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Prefix => "Prefix",
            PathType::Exact => "Exact",
            PathType::ImplementationSpecific => "ImplementationSpecific",
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A route as reported by the route source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    #[serde(default = "RouteDefinition::default_method")]
    pub method: String,
    #[serde(default)]
    pub handler: String,
    #[serde(default)]
    pub path_type: Option<PathType>,
}

impl RouteDefinition {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            handler: handler.into(),
            path_type: None,
        }
    }

    fn default_method() -> String {
        "GET".to_string()
    }
}

/// Collapse repeated slashes, force a leading slash, drop a trailing one.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// A route bound to the service that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    /// Path as declared, before normalization.
    pub path: String,
    pub method: String,
    pub handler: String,
    pub path_type: PathType,
    pub service_name: String,
    pub service_port: u16,
}

impl RouteRecord {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        handler: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            handler: handler.into(),
            path_type: PathType::default(),
            service_name: service_name.into(),
            service_port: SERVICE_PORT,
        }
    }

    /// Build the record for a route definition served by `config`'s service.
    pub fn from_definition(definition: &RouteDefinition, config: &DeploymentConfig) -> Self {
        Self {
            path_type: definition.path_type.unwrap_or_default(),
            ..Self::new(
                definition.path.clone(),
                definition.method.clone(),
                definition.handler.clone(),
                config.service_name(),
            )
        }
    }

    pub fn with_path_type(mut self, path_type: PathType) -> Self {
        self.path_type = path_type;
        self
    }

    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// Parameterised and root paths can only be matched by prefix.
    pub fn optimized_path_type(&self) -> PathType {
        let has_parameter = self.path.contains('{') || self.path.contains('*');
        if has_parameter || self.normalized_path() == "/" {
            PathType::Prefix
        } else {
            self.path_type
        }
    }
}

/// How a command is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Daemon,
    #[serde(alias = "cron")]
    CronJob,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Daemon => "daemon",
            CommandKind::CronJob => "cronjob",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Command metadata as declared by the command metadata source.
///
/// `kind`, `schedule` and `replicas` are optional; missing values are inferred
/// from the command name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<CommandKind>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub replicas: Option<u32>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, rename = "env")]
    pub env_vars: IndexMap<String, String>,
    #[serde(default, rename = "resources")]
    pub resource_overrides: BTreeMap<String, String>,
}

/// Lower-case `name` and replace everything outside `[a-z0-9-]` with `-`.
pub fn derive_resource_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Check that a cron expression has 5 or 6 fields.
pub fn is_valid_schedule(schedule: &str) -> bool {
    matches!(schedule.split_whitespace().count(), 5 | 6)
}

/// A background command to deploy as a daemon or a cronjob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub name: String,
    pub description: String,
    pub args: Vec<String>,
    pub env_vars: IndexMap<String, String>,
    pub kind: CommandKind,
    /// Only meaningful for cronjobs.
    pub schedule: Option<String>,
    pub replicas: u32,
    pub resource_overrides: BTreeMap<String, String>,
}

impl CommandRecord {
    pub fn new(name: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            args: Vec::new(),
            env_vars: IndexMap::new(),
            kind,
            schedule: None,
            replicas: 1,
            resource_overrides: BTreeMap::new(),
        }
    }

    /// Build a record from declared metadata.
    ///
    /// Each of kind, schedule and replicas is taken from the metadata when
    /// declared and inferred from the name otherwise.
    pub fn from_metadata(name: &str, metadata: &CommandMetadata) -> Self {
        let kind = metadata
            .kind
            .unwrap_or_else(|| classifier::classify_kind(name));
        let schedule = match kind {
            CommandKind::CronJob => Some(
                metadata
                    .schedule
                    .clone()
                    .unwrap_or_else(|| classifier::default_schedule(name).to_string()),
            ),
            CommandKind::Daemon => None,
        };

        Self {
            name: name.to_string(),
            description: metadata.description.clone(),
            args: metadata.args.clone(),
            env_vars: metadata.env_vars.clone(),
            kind,
            schedule,
            replicas: metadata
                .replicas
                .unwrap_or_else(|| classifier::default_replicas(name)),
            resource_overrides: metadata.resource_overrides.clone(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_resource(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_overrides.insert(key.into(), value.into());
        self
    }

    pub fn resource_name(&self) -> String {
        derive_resource_name(&self.name)
    }

    pub fn merged_resources(&self) -> BTreeMap<String, String> {
        merge_resources(&self.resource_overrides)
    }

    /// Daemons are always valid; cronjobs need a 5 or 6 field schedule.
    pub fn is_valid(&self) -> bool {
        match self.kind {
            CommandKind::Daemon => true,
            CommandKind::CronJob => self.schedule.as_deref().is_some_and(is_valid_schedule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("//a//b/"), "/a/b");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path("/users/{id}"), "/users/{id}");
    }

    #[test]
    fn test_normalize_path_idempotent() {
        for path in ["", "/", "//", "a/b", "//a//b/", "/x/{id}/", "///deep///path///"] {
            let once = normalize_path(path);
            assert_eq!(normalize_path(&once), once, "not idempotent for {:?}", path);
        }
    }

    #[test]
    fn test_optimized_path_type() {
        let exact = RouteRecord::new("/health", "GET", "Health", "svc")
            .with_path_type(PathType::Exact);
        assert_eq!(exact.optimized_path_type(), PathType::Exact);

        let param = RouteRecord::new("/users/{id}", "GET", "User", "svc")
            .with_path_type(PathType::Exact);
        assert_eq!(param.optimized_path_type(), PathType::Prefix);

        let wildcard = RouteRecord::new("/static/*", "GET", "Static", "svc")
            .with_path_type(PathType::ImplementationSpecific);
        assert_eq!(wildcard.optimized_path_type(), PathType::Prefix);

        let root = RouteRecord::new("//", "GET", "Root", "svc").with_path_type(PathType::Exact);
        assert_eq!(root.optimized_path_type(), PathType::Prefix);
    }

    #[test]
    fn test_derive_resource_name() {
        assert_eq!(derive_resource_name("My Worker!"), "my-worker-");
        assert_eq!(derive_resource_name("queue:work"), "queue-work");
        assert_eq!(derive_resource_name("sync-users"), "sync-users");
    }

    #[test]
    fn test_schedule_validity() {
        let base = CommandRecord::new("report", CommandKind::CronJob);
        assert!(base.clone().with_schedule("*/5 * * * *").is_valid());
        assert!(base.clone().with_schedule("0 0 * * * *").is_valid());
        assert!(!base.clone().with_schedule("* * * *").is_valid());
        assert!(!base.clone().with_schedule("* * * * * * *").is_valid());
        assert!(!base.is_valid());
    }

    #[test]
    fn test_daemon_always_valid() {
        let daemon = CommandRecord::new("worker", CommandKind::Daemon);
        assert!(daemon.is_valid());
        assert!(daemon.with_schedule("nonsense").is_valid());
    }

    #[test]
    fn test_merged_resources() {
        let config = DeploymentConfig::new("shop", "registry/shop")
            .with_resource("MEMORY_LIMIT", "1Gi")
            .with_resource("GPU", "1");

        let merged = config.merged_resources();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged["MEMORY_LIMIT"], "1Gi");
        assert_eq!(merged["CPU_REQUEST"], "100m");
        assert!(!merged.contains_key("GPU"));
    }

    #[test]
    fn test_from_metadata_prefers_declared_values() {
        let metadata = CommandMetadata {
            kind: Some(CommandKind::CronJob),
            schedule: Some("30 2 * * *".to_string()),
            replicas: Some(3),
            ..Default::default()
        };

        let record = CommandRecord::from_metadata("daily-report", &metadata);
        assert_eq!(record.kind, CommandKind::CronJob);
        assert_eq!(record.schedule.as_deref(), Some("30 2 * * *"));
        assert_eq!(record.replicas, 3);
    }

    #[test]
    fn test_from_metadata_falls_back_per_field() {
        let metadata = CommandMetadata {
            kind: Some(CommandKind::CronJob),
            ..Default::default()
        };

        let record = CommandRecord::from_metadata("daily-report", &metadata);
        assert_eq!(record.schedule.as_deref(), Some("0 0 * * *"));
        assert_eq!(record.replicas, 1);
    }

    #[test]
    fn test_daily_report_defaults_to_daemon() {
        let record = CommandRecord::from_metadata("daily-report", &CommandMetadata::default());
        assert_eq!(record.kind, CommandKind::Daemon);
        assert_eq!(record.schedule, None);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
name: shop
image: registry.example.com/shop
domain: shop.example.com
env:
  APP_DEBUG: "false"
resources:
  CPU_LIMIT: 1000m
"#;
        let config: DeploymentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app_name, "shop");
        assert_eq!(config.image_tag, "latest");
        assert_eq!(config.replicas, 1);
        assert_eq!(config.deploy_path, PathBuf::from("deploy"));
        assert_eq!(config.env_vars["APP_DEBUG"], "false");
        assert_eq!(config.merged_resources()["CPU_LIMIT"], "1000m");
    }

    #[test]
    fn test_config_env_keeps_declaration_order() {
        let yaml = "name: shop\nimage: shop\nenv:\n  ZED: '1'\n  ALPHA: '2'\n  MIDDLE: '3'\n";
        let config: DeploymentConfig = serde_yaml::from_str(yaml).unwrap();

        let keys: Vec<&str> = config.env_vars.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ZED", "ALPHA", "MIDDLE"]);
    }
}
