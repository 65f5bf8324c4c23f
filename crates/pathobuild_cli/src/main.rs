//! pathobuild CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Template error
//! - 4: Step failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pathobuild_runner::RunnerError;
use pathobuild_templates::TemplateError;

mod commands;
mod settings;

use commands::{Cli, Commands};
use settings::Settings;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 3;
    pub const STEP_FAILURE: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "warn,pathobuild=debug"
    } else if cli.quiet {
        "warn"
    } else {
        "warn,pathobuild=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => match cli.command {
            Commands::Expand(args) => commands::expand::execute(args, settings).await,
            Commands::Run(args) => commands::run::execute(args, settings).await,
            Commands::Build(args) => commands::build::execute(args, settings).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<RunnerError>() {
            return match err {
                RunnerError::Render { .. } => ExitCodes::TEMPLATE_ERROR,
                _ => ExitCodes::STEP_FAILURE,
            };
        }
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return match err {
                TemplateError::Io(_) | TemplateError::UnsupportedFormat(_) => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::TEMPLATE_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("had failing steps") {
        ExitCodes::STEP_FAILURE
    } else if msg.contains("not found") || msg.contains("settings file") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
