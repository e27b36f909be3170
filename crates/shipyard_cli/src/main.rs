//! Shipyard CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or project file
//! - 4: Template error
//! - 6: Broken installation (built-in templates missing)

use std::process::ExitCode;

use clap::Parser;
use shipyard_deploy::DeployError;
use shipyard_templates::TemplateError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, Context};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const INSTALLATION_ERROR: u8 = 6;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let context = Context::from_cli(&cli);
    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &context),
        Commands::Generate(args) => commands::generate::execute(args, &context),
        Commands::List(args) => commands::list::execute(args, &context),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shipyard={},warn", level)));

    let log_result = tracing_subscriber::registry()
        .with(filter)
        .with(
            cli.log_json
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json).then(|| {
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
            }),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(deploy) = cause.downcast_ref::<DeployError>() {
            return match deploy {
                DeployError::Template(_) => ExitCodes::TEMPLATE_ERROR,
                DeployError::ScaffoldSourceMissing(_) => ExitCodes::INSTALLATION_ERROR,
                DeployError::ConfigNotFound(_)
                | DeployError::InvalidConfig { .. }
                | DeployError::Yaml(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if cause.downcast_ref::<TemplateError>().is_some() {
            return ExitCodes::TEMPLATE_ERROR;
        }
        if cause.downcast_ref::<clap::Error>().is_some() {
            return ExitCodes::INVALID_ARGS;
        }
    }
    ExitCodes::GENERAL_ERROR
}
