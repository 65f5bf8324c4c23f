//! Settings file handling.
//!
//! `pathobuild.toml` holds an `[expand]` table (expansion options) and a
//! `[runner]` table (step configuration). Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pathobuild_runner::RunnerConfig;
use pathobuild_templates::ExpandOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "pathobuild.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub expand: ExpandOptions,
    pub runner: RunnerConfig,
}

impl Settings {
    /// Load settings from `path`, or from the default file if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if default.exists() {
                    Self::from_file(&default)
                } else {
                    debug!("No {} found, using default settings", DEFAULT_SETTINGS_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading settings from {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathobuild_templates::VariablePolicy;
    use tempfile::tempdir;

    #[test]
    fn test_settings_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("pathobuild.toml");
        fs::write(
            &path,
            r#"
[expand]
identifier_field = "name"
variable_policy = "require_list"

[runner]
bin = "python2"
fail_fast = true
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.expand.identifier_field, "name");
        assert_eq!(settings.expand.variable_policy, VariablePolicy::RequireList);
        assert_eq!(settings.runner.bin, "python2");
        assert!(settings.runner.fail_fast);
        assert_eq!(settings.runner.process, RunnerConfig::default().process);
    }

    #[test]
    fn test_demo_settings_match_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/pathobuild.toml");
        let settings = Settings::from_file(&path).unwrap();

        assert_eq!(settings.expand, ExpandOptions::default());
        assert_eq!(settings.runner, RunnerConfig::default().bin("python2"));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let temp = tempdir().unwrap();
        let err = Settings::load(Some(temp.path().join("absent.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }
}
