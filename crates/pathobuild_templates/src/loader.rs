//! Build template loading from YAML, JSON and TOML files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::template::BuildTemplate;

/// Supported template document formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Yaml,
    Json,
    Toml,
}

impl TemplateFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A template file is either a bare list or a mapping with a `builds` list.
#[derive(Deserialize)]
#[serde(untagged)]
enum TemplateDocument {
    List(Vec<BuildTemplate>),
    Builds { builds: Vec<BuildTemplate> },
}

impl TemplateDocument {
    fn into_templates(self) -> Vec<BuildTemplate> {
        match self {
            Self::List(templates) | Self::Builds { builds: templates } => templates,
        }
    }
}

/// Loader for build template files.
pub struct TemplateLoader;

impl TemplateLoader {
    /// Load templates from a file, or from every template file in a directory.
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Vec<BuildTemplate>> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_file(path)
        }
    }

    /// Load every template file directly inside `dir`, ordered by file name.
    pub fn load_dir(dir: impl AsRef<Path>) -> TemplateResult<Vec<BuildTemplate>> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| TemplateError::InvalidFile {
                path: dir.to_path_buf(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if path.is_file() && TemplateFormat::from_path(path).is_some() {
                files.push(path.to_path_buf());
            }
        }

        let mut templates = Vec::new();
        for file in &files {
            templates.extend(Self::load_file(file)?);
        }

        info!(
            "Loaded {} build template(s) from {} file(s) in {:?}",
            templates.len(),
            files.len(),
            dir
        );
        Ok(templates)
    }

    /// Load templates from a single file.
    pub fn load_file(path: impl AsRef<Path>) -> TemplateResult<Vec<BuildTemplate>> {
        let path = path.as_ref();
        let format = TemplateFormat::from_path(path)
            .ok_or_else(|| TemplateError::UnsupportedFormat(path.to_path_buf()))?;

        debug!("Loading build templates from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse templates from a string in the given format.
    pub fn parse(content: &str, format: TemplateFormat) -> TemplateResult<Vec<BuildTemplate>> {
        let document: TemplateDocument = match format {
            TemplateFormat::Yaml => serde_yaml::from_str(content)?,
            TemplateFormat::Json => serde_json::from_str(content)?,
            TemplateFormat::Toml => toml::from_str(content)?,
        };
        Ok(document.into_templates())
    }
}
