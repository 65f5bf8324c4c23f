//! Build command - Download and process a single virus.

use anyhow::{Context, Result};
use clap::Args;

use pathobuild_templates::{BuildExpander, BuildTemplate, ExpandOptions};

use super::run::{finish, run_builds, StepArgs};
use crate::settings::Settings;

#[derive(Args)]
pub struct BuildArgs {
    /// Virus to download and process
    #[arg(long, default_value = "zika")]
    pub virus: String,

    /// Dataset spec passed through to the build fields
    #[arg(long, default_value = "")]
    pub spec: String,

    #[command(flatten)]
    pub step: StepArgs,
}

/// The single-virus build as a template whose identifier is the virus.
fn template(args: &BuildArgs) -> BuildTemplate {
    BuildTemplate::new()
        .with("stem", "{virus}")
        .with("virus", args.virus.as_str())
        .with("spec", args.spec.as_str())
}

pub async fn execute(args: BuildArgs, settings: Settings) -> Result<()> {
    println!("Processing {} with spec '{}'", args.virus, args.spec);

    let expander = BuildExpander::new(ExpandOptions::new());
    let expansion = expander
        .expand(&[template(&args)])
        .with_context(|| format!("Invalid virus name '{}'", args.virus))?;

    let config = args.step.config(settings.runner);
    let report = run_builds(expansion.builds.values().collect(), config).await?;
    finish(&report, args.step.report.as_deref())
}
