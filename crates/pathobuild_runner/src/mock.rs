//! Mock step runner for testing.
//!
//! Captures every step it is asked to run and answers with queued
//! responses, so pipelines can be tested without spawning processes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{StepCommand, StepKind};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, StepRunner};

/// Predefined mock response for a step.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Mock step runner.
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Responses returned in order; empty means every step succeeds.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured: Arc<RwLock<Vec<StepCommand>>>,
    /// Spawn-style failure returned for every call when set.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock response for the next step.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// All steps run so far, in order.
    pub fn calls(&self) -> Vec<StepCommand> {
        self.captured.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    pub fn calls_for(&self, kind: StepKind) -> Vec<StepCommand> {
        self.captured
            .read()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl StepRunner for MockRunner {
    async fn run_step(&self, command: &StepCommand) -> RunnerResult<ExecutionResult> {
        self.captured.write().push(command.clone());

        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }

        let response = self.next_response();
        let now = Utc::now();
        Ok(ExecutionResult {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        })
    }
}
