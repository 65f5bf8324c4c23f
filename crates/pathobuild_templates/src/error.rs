//! Error types for build templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while parsing, loading or expanding build templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Malformed placeholder in template {template:?}: {message}")]
    MalformedPlaceholder { template: String, message: String },

    #[error("Formatting failed for template {template:?}: {message}")]
    Formatting { template: String, message: String },

    #[error("Build template is missing identifier field '{0}'")]
    MissingIdentifier(String),

    #[error("Identifier field '{field}' must be a string, found {found}")]
    InvalidIdentifier { field: String, found: String },

    #[error("Variable '{variable}' referenced by {identifier:?} is not defined in the template")]
    MissingVariable { variable: String, identifier: String },

    #[error("Variable '{variable}' referenced by {identifier:?} must be a list, found {found}")]
    NotAList {
        variable: String,
        identifier: String,
        found: String,
    },

    #[error("Field '{field}' referenced by {identifier:?} must be a string, found {found}")]
    NonStringField {
        field: String,
        identifier: String,
        found: String,
    },

    #[error("Template {identifier:?} expands to {count} combinations, limit is {limit}")]
    TooManyCombinations {
        identifier: String,
        count: usize,
        limit: usize,
    },

    #[error("Unsupported template file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid template file {path}: {message}")]
    InvalidFile { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
