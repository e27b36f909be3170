//! Init command - Seed the deploy tree.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use shipyard_deploy::{ManifestGenerator, PathProvider, ProjectFile, ProjectLocator};
use tracing::{debug, info};

use super::Context;

#[derive(Args)]
pub struct InitArgs {
    /// Environments to create overlays for
    #[arg(short, long = "env", value_delimiter = ',', default_values_t = vec!["staging".to_string(), "production".to_string()])]
    envs: Vec<String>,
}

pub fn execute(args: InitArgs, context: &Context) -> Result<()> {
    let root = init_root(context)?;
    info!("Initializing deploy tree at {:?}", root);

    // Overlays pick up the app identity when a project file already exists.
    let project_path = root.join(ProjectLocator::PROJECT_FILE);
    let settings = if project_path.is_file() {
        let project = ProjectFile::load(&project_path).context("Failed to load project file")?;
        context.project_settings(root.clone(), project.config())
    } else {
        debug!("No project file at {:?}, using defaults", project_path);
        context.settings(root.clone())
    };

    let deploy_dir = root.join(&settings.deploy_dir);
    let report = ManifestGenerator::new(settings)
        .initialize(&args.envs)
        .context("Failed to initialize deploy tree")?;

    if context.quiet {
        return Ok(());
    }

    println!("✅ Deploy tree initialized at {}", deploy_dir.display());
    println!();
    println!(
        "  📁 base/  - {} copied, {} kept",
        report.base.copied_files.len(),
        report.base.skipped_files.len()
    );
    for (env, seeded) in &report.environments {
        println!(
            "  📁 {}/  - {} copied, {} kept",
            env,
            seeded.copied_files.len(),
            seeded.skipped_files.len()
        );
    }
    println!();
    println!("Next steps:");
    println!("  shipyard generate all");

    Ok(())
}

/// `--path`, the discovered project root, or the working directory.
fn init_root(context: &Context) -> Result<PathBuf> {
    if let Some(path) = &context.path {
        return Ok(path.clone());
    }
    let current_dir = std::env::current_dir()?;
    Ok(ProjectLocator::new(&current_dir)
        .project_root()
        .unwrap_or(current_dir))
}
