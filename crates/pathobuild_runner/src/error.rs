//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running build steps.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to render {step} step for build '{build}': {source}")]
    Render {
        step: String,
        build: String,
        #[source]
        source: pathobuild_templates::TemplateError,
    },

    #[error("Failed to spawn '{program}': {message}")]
    SpawnFailed { program: String, message: String },

    #[error("{step} step for build '{build}' exited with code {exit_code}")]
    StepFailed {
        step: String,
        build: String,
        exit_code: i32,
    },

    #[error("Step execution failed: {0}")]
    ExecutionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
