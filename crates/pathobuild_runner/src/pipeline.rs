//! Runs the download and process steps for expanded builds.

use std::fs::File;
use std::path::Path;

use pathobuild_templates::{BuildConfig, Expansion};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{RunnerConfig, StepCommand, StepKind};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::StepRunner;

/// How a single step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed { exit_code: i32 },
    /// Not run because an earlier step of the same build failed.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub kind: StepKind,
    pub command: String,
    #[serde(flatten)]
    pub status: StepStatus,
    pub duration_ms: u64,
}

/// Outcome of both steps for one build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub build: String,
    pub steps: Vec<StepOutcome>,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.status == StepStatus::Succeeded)
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.kind == kind)
    }
}

/// Outcomes of a whole run, in the order builds were run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub builds: Vec<BuildOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.builds.iter().filter(|b| b.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.builds.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> RunnerResult<()> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Runs builds through a [`StepRunner`].
pub struct BuildPipeline<R: StepRunner> {
    runner: R,
    config: RunnerConfig,
}

impl<R: StepRunner> BuildPipeline<R> {
    pub fn new(runner: R, config: RunnerConfig) -> Self {
        Self { runner, config }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every build of `expansion` in identifier order.
    pub async fn run_all(&self, expansion: &Expansion) -> RunnerResult<RunReport> {
        self.run_builds(expansion.builds.values()).await
    }

    /// Run the given builds in order. Every build's commands are rendered
    /// before the first step runs.
    pub async fn run_builds<'a>(
        &self,
        builds: impl IntoIterator<Item = &'a BuildConfig>,
    ) -> RunnerResult<RunReport> {
        let planned = builds
            .into_iter()
            .map(|build| Ok((build, self.render(build)?)))
            .collect::<RunnerResult<Vec<_>>>()?;

        let mut report = RunReport::default();
        for (build, commands) in &planned {
            let outcome = self.execute(build, commands).await?;
            report.builds.push(outcome);
        }

        info!(
            "Finished {} build(s): {} succeeded, {} failed",
            report.builds.len(),
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Download then process a single build. A failed download skips the
    /// process step. With `fail_fast`, a failed step aborts with
    /// [`RunnerError::StepFailed`].
    pub async fn run_build(&self, build: &BuildConfig) -> RunnerResult<BuildOutcome> {
        let commands = self.render(build)?;
        self.execute(build, &commands).await
    }

    fn render(&self, build: &BuildConfig) -> RunnerResult<Vec<StepCommand>> {
        [StepKind::Download, StepKind::Process]
            .into_iter()
            .map(|kind| self.config.command_for(kind, build))
            .collect()
    }

    async fn execute(
        &self,
        build: &BuildConfig,
        commands: &[StepCommand],
    ) -> RunnerResult<BuildOutcome> {
        info!("Processing build '{}'", build.identifier());

        let mut steps = Vec::with_capacity(commands.len());
        let mut failed = false;

        for command in commands {
            if failed {
                steps.push(StepOutcome {
                    kind: command.kind,
                    command: command.display(),
                    status: StepStatus::Skipped,
                    duration_ms: 0,
                });
                continue;
            }

            info!("Running {} step for '{}'", command.kind, command.build);
            let result = self.runner.run_step(command).await?;

            let status = if result.success() {
                StepStatus::Succeeded
            } else {
                warn!(
                    "{} step for '{}' exited with code {}: {}",
                    command.kind,
                    command.build,
                    result.exit_code,
                    result.stderr.trim()
                );
                if self.config.fail_fast {
                    return Err(RunnerError::StepFailed {
                        step: command.kind.to_string(),
                        build: command.build.clone(),
                        exit_code: result.exit_code,
                    });
                }
                failed = true;
                StepStatus::Failed {
                    exit_code: result.exit_code,
                }
            };

            steps.push(StepOutcome {
                kind: command.kind,
                command: command.display(),
                status,
                duration_ms: result.duration_ms,
            });
        }

        Ok(BuildOutcome {
            build: build.identifier().to_string(),
            steps,
        })
    }
}
