//! Step runner backed by child processes.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::StepCommand;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, StepRunner};

/// Runs each step as a child process in its working directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    dry_run: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log commands instead of spawning them.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

#[async_trait]
impl StepRunner for ProcessRunner {
    async fn run_step(&self, command: &StepCommand) -> RunnerResult<ExecutionResult> {
        let started_at = Utc::now();

        if self.dry_run {
            info!(
                "[dry-run] {} {}: (cd {:?} && {})",
                command.kind,
                command.build,
                command.workdir,
                command.display()
            );
            return Ok(ExecutionResult {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                started_at,
                finished_at: started_at,
                duration_ms: 0,
            });
        }

        debug!("Executing in {:?}: {}", command.workdir, command.display());
        let start = Instant::now();

        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.workdir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RunnerError::SpawnFailed {
                program: command.program.clone(),
                message: e.to_string(),
            })?;

        // Killed by a signal reports no exit code.
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(ExecutionResult {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
