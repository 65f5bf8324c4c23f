//! Expand command - Print expanded builds.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Args, ValueEnum};

use pathobuild_templates::{Expansion, FieldValue};

use super::TemplateArgs;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    /// One identifier per line
    Names,
}

#[derive(Args)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub templates: TemplateArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

pub async fn execute(args: ExpandArgs, settings: Settings) -> Result<()> {
    let expansion = args.templates.expand(settings.expand)?;
    println!("{}", render(&expansion, args.format)?);
    Ok(())
}

/// Render builds as a mapping of identifier to fields.
pub fn render(expansion: &Expansion, format: OutputFormat) -> Result<String> {
    let builds: BTreeMap<&str, &BTreeMap<String, FieldValue>> = expansion
        .iter()
        .map(|(id, build)| (id, build.fields()))
        .collect();

    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&builds)?,
        OutputFormat::Yaml => serde_yaml::to_string(&builds)?.trim_end().to_string(),
        OutputFormat::Names => builds.keys().copied().collect::<Vec<_>>().join("\n"),
    })
}
