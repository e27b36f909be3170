//! Manifest generation service.
//!
//! Wires the binder, template resolver, manifest writer and resource index
//! together. Generated files land in `<deploy>/base/` and are registered in
//! `<deploy>/base/kustomization.yaml`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use shipyard_templates::{ManifestWriter, TemplateResolver, TemplateSearchPath, TemplateVariables};
use tracing::{debug, info, warn};

use crate::binder;
use crate::error::{DeployError, DeployResult};
use crate::index::{IndexPolicy, ResourceIndex};
use crate::models::{CommandKind, CommandRecord, DeploymentConfig, RouteRecord};
use crate::scaffold::{DirectoryScaffold, SeedReport};
use crate::sources::{CommandMetadataSource, RouteSource};

/// Built-in template tree shipped with this crate.
pub const BUILTIN_TEMPLATES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

pub const INGRESS_TEMPLATE: &str = "ingress-tpl.yaml";
pub const DAEMON_TEMPLATE: &str = "daemon-tpl.yaml";
pub const CRONJOB_TEMPLATE: &str = "cronjob-tpl.yaml";
pub const INDEX_FILE: &str = "kustomization.yaml";
pub const INGRESS_FILE: &str = "ingress.yaml";

const BASE_LAYER: &str = "base";
const ENV_LAYER: &str = "env";
const TEMPLATES_DIR: &str = "templates";

/// Generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub project_root: PathBuf,
    /// Root of the built-in tree (`base/` and `env/` live beneath it).
    pub builtin_templates: PathBuf,
    /// Deploy directory used by [`ManifestGenerator::initialize`], relative to
    /// the project root unless absolute.
    ///
    /// Generation writes under [`DeploymentConfig::deploy_path`] instead, so
    /// the two must agree for generated files to land in the seeded tree.
    /// [`GeneratorSettings::for_config`] keeps them in sync.
    pub deploy_dir: PathBuf,
    pub index_policy: IndexPolicy,
    pub default_app_name: String,
    pub default_image_tag: String,
}

impl GeneratorSettings {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            builtin_templates: PathBuf::from(BUILTIN_TEMPLATES_DIR),
            deploy_dir: PathBuf::from("deploy"),
            index_policy: IndexPolicy::default(),
            default_app_name: "app".to_string(),
            default_image_tag: "latest".to_string(),
        }
    }

    /// Settings whose deploy directory and init defaults come from `config`.
    pub fn for_config(project_root: impl Into<PathBuf>, config: &DeploymentConfig) -> Self {
        Self {
            deploy_dir: config.deploy_path.clone(),
            default_app_name: config.app_name.clone(),
            default_image_tag: config.image_tag.clone(),
            ..Self::new(project_root)
        }
    }

    pub fn with_builtin_templates(mut self, path: impl Into<PathBuf>) -> Self {
        self.builtin_templates = path.into();
        self
    }

    pub fn with_deploy_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.deploy_dir = path.into();
        self
    }

    pub fn with_index_policy(mut self, policy: IndexPolicy) -> Self {
        self.index_policy = policy;
        self
    }
}

/// A single artifact that could not be generated.
#[derive(Debug)]
pub struct GenerationFailure {
    pub name: String,
    pub error: DeployError,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

/// Rendered manifests keyed by command name, plus the ones that failed.
#[derive(Debug, Default)]
pub struct GeneratedManifests {
    pub manifests: BTreeMap<String, String>,
    /// Paths of the manifests written.
    pub written: Vec<PathBuf>,
    pub failures: Vec<GenerationFailure>,
}

impl GeneratedManifests {
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of [`ManifestGenerator::generate_all`].
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Paths of the manifests written.
    pub written: Vec<PathBuf>,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationSummary {
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of [`ManifestGenerator::initialize`].
#[derive(Debug, Default)]
pub struct InitReport {
    pub base: SeedReport,
    pub environments: BTreeMap<String, SeedReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteSummary {
    pub path: String,
    pub method: String,
    pub handler: String,
    pub path_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngressSummary {
    pub count: usize,
    pub routes: Vec<RouteSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandSummary {
    pub name: String,
    pub resource_name: String,
    pub description: String,
    pub replicas: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandGroupSummary {
    pub count: usize,
    pub commands: Vec<CommandSummary>,
}

/// What generation would produce for a project.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceSummary {
    pub ingress: IngressSummary,
    pub daemon: CommandGroupSummary,
    pub cronjob: CommandGroupSummary,
}

/// Manifest generator.
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    settings: GeneratorSettings,
    writer: ManifestWriter,
    index: ResourceIndex,
    scaffold: DirectoryScaffold,
}

impl ManifestGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        let index = ResourceIndex::new(settings.index_policy);
        Self {
            settings,
            writer: ManifestWriter::default(),
            index,
            scaffold: DirectoryScaffold::new(),
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    fn deploy_root(&self, deploy_path: &Path) -> PathBuf {
        self.settings.project_root.join(deploy_path)
    }

    /// Template resolver for a deploy tree: project overrides first, then the
    /// built-in templates.
    pub fn resolver(&self, deploy_path: &Path) -> TemplateResolver {
        TemplateResolver::new(TemplateSearchPath::new(
            self.deploy_root(deploy_path).join(BASE_LAYER).join(TEMPLATES_DIR),
            self.settings.builtin_templates.join(BASE_LAYER).join(TEMPLATES_DIR),
        ))
    }

    /// Seed the base layer and one overlay per environment.
    pub fn initialize(&self, environments: &[String]) -> DeployResult<InitReport> {
        let deploy_root = self.deploy_root(&self.settings.deploy_dir);
        info!("Initializing deploy tree at {:?}", deploy_root);

        let base = self.scaffold.seed(
            &self.settings.builtin_templates.join(BASE_LAYER),
            &deploy_root.join(BASE_LAYER),
        )?;

        let mut report = InitReport {
            base,
            environments: BTreeMap::new(),
        };

        for env in environments {
            let env_dir = deploy_root.join(env);
            let seeded = self
                .scaffold
                .seed(&self.settings.builtin_templates.join(ENV_LAYER), &env_dir)?;
            self.render_env_index(&env_dir, env)?;
            report.environments.insert(env.clone(), seeded);
        }

        Ok(report)
    }

    /// Fill the overlay's index file in place.
    ///
    /// Rendering an already filled index leaves it unchanged.
    fn render_env_index(&self, env_dir: &Path, env: &str) -> DeployResult<()> {
        let index_path = env_dir.join(INDEX_FILE);
        if !index_path.is_file() {
            debug!("No index file in {:?}, nothing to render", env_dir);
            return Ok(());
        }

        let template = std::fs::read_to_string(&index_path)?;
        let vars = TemplateVariables::new()
            .with("ENV_NAME", env)
            .with("NAMESPACE", env)
            .with("APP_NAME", &self.settings.default_app_name)
            .with("IMAGE_TAG", &self.settings.default_image_tag);
        self.writer.write(&template, &vars, &index_path)?;
        Ok(())
    }

    /// Render and write the ingress manifest.
    ///
    /// Returns an empty string, and writes nothing, when there are no routes.
    pub fn generate_ingress(
        &self,
        config: &DeploymentConfig,
        routes: &dyn RouteSource,
    ) -> DeployResult<String> {
        let routes: Vec<RouteRecord> = routes
            .routes()
            .iter()
            .map(|definition| RouteRecord::from_definition(definition, config))
            .collect();

        if routes.is_empty() {
            info!("No routes defined, skipping ingress");
            return Ok(String::new());
        }

        let template = self.resolver(&config.deploy_path).resolve(INGRESS_TEMPLATE)?;
        let vars = binder::bind_ingress(config, &routes);
        let base_dir = self.deploy_root(&config.deploy_path).join(BASE_LAYER);

        let rendered = self
            .writer
            .write(&template, &vars, &base_dir.join(INGRESS_FILE))?;
        self.index.register(&base_dir.join(INDEX_FILE), INGRESS_FILE)?;

        Ok(rendered)
    }

    /// Render and write one manifest per daemon command.
    pub fn generate_daemons(
        &self,
        config: &DeploymentConfig,
        commands: &dyn CommandMetadataSource,
        names: Option<&[String]>,
    ) -> DeployResult<GeneratedManifests> {
        let records = select_commands(commands, CommandKind::Daemon, names);
        self.generate_commands(config, &records, DAEMON_TEMPLATE, "daemon")
    }

    /// Render and write one manifest per cronjob command.
    ///
    /// Commands whose schedule is not a 5 or 6 field cron expression are
    /// skipped.
    pub fn generate_cronjobs(
        &self,
        config: &DeploymentConfig,
        commands: &dyn CommandMetadataSource,
        names: Option<&[String]>,
    ) -> DeployResult<GeneratedManifests> {
        let records: Vec<CommandRecord> = select_commands(commands, CommandKind::CronJob, names)
            .into_iter()
            .filter(|record| {
                let valid = record.is_valid();
                if !valid {
                    debug!("Skipping {}: invalid schedule {:?}", record.name, record.schedule);
                }
                valid
            })
            .collect();
        self.generate_commands(config, &records, CRONJOB_TEMPLATE, "cronjob")
    }

    fn generate_commands(
        &self,
        config: &DeploymentConfig,
        records: &[CommandRecord],
        template_name: &str,
        file_prefix: &str,
    ) -> DeployResult<GeneratedManifests> {
        let mut output = GeneratedManifests::default();
        if records.is_empty() {
            return Ok(output);
        }

        let template = self.resolver(&config.deploy_path).resolve(template_name)?;
        let base_dir = self.deploy_root(&config.deploy_path).join(BASE_LAYER);
        let index_path = base_dir.join(INDEX_FILE);

        // File name to the command that claimed it first.
        let mut claimed: HashMap<String, &str> = HashMap::new();

        for record in records {
            let file_name = format!("{}-{}.yaml", file_prefix, record.resource_name());
            if let Some(first) = claimed.get(&file_name) {
                warn!(
                    "Skipping {}: {} already generated for {}",
                    record.name, file_name, first
                );
                output.failures.push(GenerationFailure {
                    name: record.name.clone(),
                    error: DeployError::ResourceCollision {
                        file: file_name,
                        first: first.to_string(),
                    },
                });
                continue;
            }
            claimed.insert(file_name.clone(), &record.name);

            let vars = binder::bind_command(record, config);

            let destination = base_dir.join(&file_name);
            let result = self
                .writer
                .write(&template, &vars, &destination)
                .map_err(DeployError::from)
                .and_then(|rendered| {
                    self.index.register(&index_path, &file_name)?;
                    Ok(rendered)
                });

            match result {
                Ok(rendered) => {
                    output.manifests.insert(record.name.clone(), rendered);
                    output.written.push(destination);
                }
                Err(error) => {
                    warn!("Failed to generate {} for {}: {}", file_prefix, record.name, error);
                    output.failures.push(GenerationFailure {
                        name: record.name.clone(),
                        error,
                    });
                }
            }
        }

        Ok(output)
    }

    /// Generate every manifest, continuing past failures.
    pub fn generate_all(
        &self,
        config: &DeploymentConfig,
        routes: &dyn RouteSource,
        commands: &dyn CommandMetadataSource,
    ) -> GenerationSummary {
        let mut summary = GenerationSummary::default();
        let base_dir = self.deploy_root(&config.deploy_path).join(BASE_LAYER);

        match self.generate_ingress(config, routes) {
            Ok(rendered) if !rendered.is_empty() => {
                summary.written.push(base_dir.join(INGRESS_FILE));
            }
            Ok(_) => {}
            Err(error) => summary.failures.push(GenerationFailure {
                name: "ingress".to_string(),
                error,
            }),
        }

        let batches = [
            ("daemon", self.generate_daemons(config, commands, None)),
            ("cronjob", self.generate_cronjobs(config, commands, None)),
        ];
        for (group, batch) in batches {
            match batch {
                Ok(generated) => {
                    summary.written.extend(generated.written);
                    summary.failures.extend(generated.failures);
                }
                Err(error) => summary.failures.push(GenerationFailure {
                    name: group.to_string(),
                    error,
                }),
            }
        }

        info!(
            "Generated {} manifests with {} errors",
            summary.written.len(),
            summary.error_count()
        );
        summary
    }

    /// Summarize what generation would produce, without touching the disk.
    pub fn list_resources(
        &self,
        config: &DeploymentConfig,
        routes: &dyn RouteSource,
        commands: &dyn CommandMetadataSource,
    ) -> ResourceSummary {
        let routes: Vec<RouteSummary> = routes
            .routes()
            .iter()
            .map(|definition| {
                let record = RouteRecord::from_definition(definition, config);
                RouteSummary {
                    path: record.normalized_path(),
                    method: record.method.clone(),
                    handler: record.handler.clone(),
                    path_type: record.optimized_path_type().to_string(),
                }
            })
            .collect();

        let daemons = summarize(select_commands(commands, CommandKind::Daemon, None));
        let cronjobs = summarize(
            select_commands(commands, CommandKind::CronJob, None)
                .into_iter()
                .filter(CommandRecord::is_valid)
                .collect(),
        );

        ResourceSummary {
            ingress: IngressSummary {
                count: routes.len(),
                routes,
            },
            daemon: daemons,
            cronjob: cronjobs,
        }
    }
}

/// Build records of one kind, optionally restricted to `names`.
fn select_commands(
    source: &dyn CommandMetadataSource,
    kind: CommandKind,
    names: Option<&[String]>,
) -> Vec<CommandRecord> {
    let commands = source.commands();

    if let Some(names) = names {
        for name in names {
            if !commands.contains_key(name) {
                debug!("Unknown command {} requested, ignoring", name);
            }
        }
    }

    commands
        .iter()
        .filter(|(name, _)| names.map_or(true, |wanted| wanted.contains(name)))
        .map(|(name, metadata)| CommandRecord::from_metadata(name, metadata))
        .filter(|record| record.kind == kind)
        .collect()
}

fn summarize(records: Vec<CommandRecord>) -> CommandGroupSummary {
    let commands: Vec<CommandSummary> = records
        .into_iter()
        .map(|record| CommandSummary {
            resource_name: record.resource_name(),
            name: record.name,
            description: record.description,
            replicas: record.replicas,
            schedule: record.schedule,
        })
        .collect();

    CommandGroupSummary {
        count: commands.len(),
        commands,
    }
}
