//! CLI command definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use pathobuild_templates::{
    BuildExpander, BuildTemplate, ExpandOptions, Expansion, NonStringPolicy, TemplateLoader,
};

pub mod build;
pub mod expand;
pub mod run;

/// pathobuild - expand build templates and run download/process pipelines
#[derive(Parser)]
#[command(name = "pathobuild")]
#[command(version, about = "Expand build templates and run download/process pipelines")]
#[command(long_about = r#"
pathobuild expands parameterized build templates into concrete builds, one per
combination of the variables named in each template's identifier, and runs
the download and process steps for each of them.

COMMANDS:
  expand  → Print the expanded builds
  run     → Expand templates, then download and process every build
  build   → Download and process a single virus

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Template error
  4 - Step failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (defaults to ./pathobuild.toml when present)
    #[arg(short, long, global = true, env = "PATHOBUILD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand build templates and print the resulting builds
    Expand(expand::ExpandArgs),

    /// Expand build templates and run every build
    Run(run::RunArgs),

    /// Run the download and process steps for a single virus
    Build(build::BuildArgs),
}

/// Template selection and expansion flags shared by `expand` and `run`.
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Template files or directories of template files
    #[arg(short, long = "templates", required = true, num_args = 1..)]
    pub templates: Vec<PathBuf>,

    /// Field holding the identifier template
    #[arg(long)]
    pub identifier_field: Option<String>,

    /// Require variables to be lists instead of wrapping single values
    #[arg(long)]
    pub strict: bool,

    /// Reject non-string fields that are not variables
    #[arg(long)]
    pub reject_non_string: bool,

    /// Skip failing templates instead of aborting
    #[arg(long)]
    pub isolate_failures: bool,

    /// Maximum number of combinations per template
    #[arg(long)]
    pub max_combinations: Option<usize>,
}

impl TemplateArgs {
    /// Overlay command-line flags on the settings file options.
    pub fn options(&self, mut options: ExpandOptions) -> ExpandOptions {
        if let Some(field) = &self.identifier_field {
            options = options.identifier_field(field.clone());
        }
        if self.strict {
            options = options.strict();
        }
        if self.reject_non_string {
            options = options.non_string_fields(NonStringPolicy::Reject);
        }
        if self.isolate_failures {
            options = options.isolate_failures(true);
        }
        if let Some(limit) = self.max_combinations {
            options = options.max_combinations(limit);
        }
        options
    }

    /// Load all templates and expand them.
    pub fn expand(&self, options: ExpandOptions) -> Result<Expansion> {
        let mut templates: Vec<BuildTemplate> = Vec::new();
        for path in &self.templates {
            let loaded = TemplateLoader::load(path)
                .with_context(|| format!("Failed to load templates from {}", path.display()))?;
            templates.extend(loaded);
        }
        info!("Loaded {} build template(s)", templates.len());

        let expander = BuildExpander::new(self.options(options));
        let expansion = expander
            .expand(&templates)
            .context("Failed to expand build templates")?;

        for failure in &expansion.failures {
            eprintln!(
                "⚠️  Skipped template #{}: {}",
                failure.template_index, failure.error
            );
        }
        for collision in &expansion.collisions {
            eprintln!(
                "⚠️  Build '{}' from template #{} overrides template #{}",
                collision.identifier, collision.kept_template, collision.replaced_template
            );
        }

        Ok(expansion)
    }
}
