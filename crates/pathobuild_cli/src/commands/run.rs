//! Run command - Expand templates and run every build.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use pathobuild_runner::{BuildPipeline, ProcessRunner, RunReport, RunnerConfig};
use pathobuild_templates::BuildConfig;

use super::TemplateArgs;
use crate::settings::Settings;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub templates: TemplateArgs,

    /// Only run the builds with these identifiers
    #[arg(long = "only")]
    pub only: Vec<String>,

    #[command(flatten)]
    pub step: StepArgs,
}

/// Step execution flags shared by `run` and `build`.
#[derive(Args, Debug)]
pub struct StepArgs {
    /// Interpreter used to run the download and process scripts
    #[arg(long)]
    pub bin: Option<String>,

    /// Directory containing the fauna and augur checkouts
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Print commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first failing step
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a JSON run report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl StepArgs {
    pub fn config(&self, mut config: RunnerConfig) -> RunnerConfig {
        if let Some(bin) = &self.bin {
            config = config.bin(bin.clone());
        }
        if let Some(root) = &self.root {
            config = config.root(root.clone());
        }
        if self.dry_run {
            config = config.dry_run(true);
        }
        if self.fail_fast {
            config = config.fail_fast(true);
        }
        config
    }
}

pub async fn execute(args: RunArgs, settings: Settings) -> Result<()> {
    // Expansion errors surface here, before any step runs.
    let expansion = args.templates.expand(settings.expand)?;

    let selected: Vec<&BuildConfig> = if args.only.is_empty() {
        expansion.builds.values().collect()
    } else {
        let mut selected = Vec::new();
        for id in &args.only {
            match expansion.get(id) {
                Some(build) => selected.push(build),
                None => bail!("Build not found: {}", id),
            }
        }
        selected
    };

    let config = args.step.config(settings.runner);
    let report = run_builds(selected, config).await?;
    finish(&report, args.step.report.as_deref())
}

/// Run `builds` with a process runner built from `config`.
pub async fn run_builds(builds: Vec<&BuildConfig>, config: RunnerConfig) -> Result<RunReport> {
    if builds.is_empty() {
        println!("⚠️  No builds to run");
        return Ok(RunReport::default());
    }

    info!("Running {} build(s) with '{}'", builds.len(), config.bin);
    let runner = ProcessRunner::new().dry_run(config.dry_run);
    let pipeline = BuildPipeline::new(runner, config);
    let report = pipeline.run_builds(builds).await?;
    Ok(report)
}

/// Print a summary, write the report if requested, and fail on failed builds.
pub fn finish(report: &RunReport, report_path: Option<&std::path::Path>) -> Result<()> {
    for outcome in &report.builds {
        let mark = if outcome.succeeded() { "✅" } else { "❌" };
        println!("{} {}", mark, outcome.build);
    }

    if let Some(path) = report_path {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    println!();
    println!(
        "Results: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );

    if !report.all_succeeded() {
        bail!("{} build(s) had failing steps", report.failed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathobuild_templates::{prepare_builds, BuildTemplate};

    #[test]
    fn test_step_flags_override_config() {
        let args = StepArgs {
            bin: Some("python2".to_string()),
            root: None,
            dry_run: true,
            fail_fast: false,
            report: None,
        };
        let config = args.config(RunnerConfig::new().root("/srv").fail_fast(true));

        assert_eq!(config.bin, "python2");
        assert_eq!(config.root, PathBuf::from("/srv"));
        assert!(config.dry_run);
        assert!(config.fail_fast);
    }

    #[tokio::test]
    async fn test_dry_run_reports_success() {
        let builds = prepare_builds(&[BuildTemplate::new()
            .with("stem", "{virus}")
            .with("virus", vec!["zika"])])
        .unwrap();

        let config = RunnerConfig::new().dry_run(true);
        let report = run_builds(builds.builds.values().collect(), config).await.unwrap();
        assert!(report.all_succeeded());
        assert!(finish(&report, None).is_ok());
    }
}
