//! Generate command - Render deployment manifests.

use anyhow::{bail, Context as _, Result};
use clap::error::ErrorKind;
use clap::{Args, ValueEnum};
use shipyard_deploy::{GeneratedManifests, GenerationFailure};
use tracing::info;

use super::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Ingress,
    Daemon,
    Cronjob,
    All,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// What to generate
    #[arg(value_enum, default_value_t = Target::All)]
    target: Target,

    /// Only generate these commands (daemon and cronjob targets)
    #[arg(short, long = "name", value_delimiter = ',')]
    names: Vec<String>,
}

impl GenerateArgs {
    /// `--name` only narrows command targets.
    fn validate(&self) -> Result<(), clap::Error> {
        if self.names.is_empty() || matches!(self.target, Target::Daemon | Target::Cronjob) {
            return Ok(());
        }

        let target = self
            .target
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default();
        Err(clap::Error::raw(
            ErrorKind::ArgumentConflict,
            format!(
                "--name cannot be used with the '{}' target, only with 'daemon' or 'cronjob'\n",
                target
            ),
        ))
    }
}

pub fn execute(args: GenerateArgs, context: &Context) -> Result<()> {
    args.validate()?;
    let project = context.open_project()?;
    let config = project.file.config();
    let generator = &project.generator;
    let names = (!args.names.is_empty()).then_some(args.names.as_slice());

    info!("Generating {:?} manifests for {}", args.target, config.app_name);

    let (written, failures) = match args.target {
        Target::Ingress => {
            let rendered = generator
                .generate_ingress(config, &project.file)
                .context("Failed to generate ingress")?;
            if rendered.is_empty() {
                println!("⚠️  No routes defined, nothing to generate");
            }
            let count = usize::from(!rendered.is_empty());
            (count, Vec::new())
        }
        Target::Daemon => batch(
            generator
                .generate_daemons(config, &project.file, names)
                .context("Failed to generate daemons")?,
        ),
        Target::Cronjob => batch(
            generator
                .generate_cronjobs(config, &project.file, names)
                .context("Failed to generate cronjobs")?,
        ),
        Target::All => {
            let summary = generator.generate_all(config, &project.file, &project.file);
            (summary.written.len(), summary.failures)
        }
    };

    for failure in &failures {
        eprintln!("   - {}", failure);
    }
    if !failures.is_empty() {
        bail!("{} of {} manifests failed", failures.len(), written + failures.len());
    }

    if !context.quiet {
        println!(
            "✅ Generated {} manifest(s) in {}",
            written,
            project.root.join(&config.deploy_path).join("base").display()
        );
    }
    Ok(())
}

fn batch(generated: GeneratedManifests) -> (usize, Vec<GenerationFailure>) {
    (generated.written.len(), generated.failures)
}
