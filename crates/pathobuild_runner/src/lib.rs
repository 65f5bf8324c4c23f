//! # pathobuild_runner
//!
//! Download and process step execution for pathobuild.
//!
//! Every expanded build runs two external steps: a download step (fauna by
//! default) and a process step (augur by default). Step arguments are
//! templates over the build's fields, so the same runner configuration
//! serves every pathogen.
//!
//! # Example
//!
//! ```rust,no_run
//! use pathobuild_runner::{BuildPipeline, ProcessRunner, RunnerConfig};
//! use pathobuild_templates::{prepare_builds, BuildTemplate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builds = prepare_builds(&[BuildTemplate::new()
//!         .with("stem", "{virus}")
//!         .with("virus", vec!["zika", "ebola"])])?;
//!
//!     let config = RunnerConfig::new().bin("python2");
//!     let pipeline = BuildPipeline::new(ProcessRunner::new(), config);
//!     let report = pipeline.run_all(&builds).await?;
//!     println!("{} build(s) succeeded", report.succeeded());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod process;
pub mod runner;

pub use config::{RunnerConfig, StepCommand, StepKind, StepSpec};
pub use error::{RunnerError, RunnerResult};
pub use mock::{MockResponse, MockRunner};
pub use pipeline::{BuildOutcome, BuildPipeline, RunReport, StepOutcome, StepStatus};
pub use process::ProcessRunner;
pub use runner::{ExecutionResult, StepRunner};
