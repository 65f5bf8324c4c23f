//! Step and runner configuration types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use pathobuild_templates::{BuildConfig, FieldValue, TemplateString};
use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// The two steps run for every build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Download,
    Process,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Process => write!(f, "process"),
        }
    }
}

/// How to invoke one step. Arguments are templates over the build's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    /// Directory the step runs in, relative to the runner's working directory.
    pub workdir: PathBuf,
    /// Script and arguments passed to the interpreter.
    pub args: Vec<String>,
}

impl StepSpec {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Fauna download: `vdb/{virus}_download.py -db vdb -v {virus} --fstem {stem}`.
    pub fn fauna_download() -> Self {
        Self::new("fauna")
            .arg("vdb/{virus}_download.py")
            .arg("-db")
            .arg("vdb")
            .arg("-v")
            .arg("{virus}")
            .arg("--fstem")
            .arg("{stem}")
    }

    /// Augur processing: `{virus}/{virus}.py`.
    pub fn augur_process() -> Self {
        Self::new("augur").arg("{virus}/{virus}.py")
    }

    /// Render this spec into a concrete command for `build`.
    pub fn render(&self, bin: &str, kind: StepKind, build: &BuildConfig) -> RunnerResult<StepCommand> {
        let values: BTreeMap<String, FieldValue> = build
            .scalar_values()
            .into_iter()
            .map(|(k, v)| (k, FieldValue::String(v)))
            .collect();

        let args = self
            .args
            .iter()
            .map(|arg| TemplateString::parse(arg).and_then(|t| t.format(&values)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| RunnerError::Render {
                step: kind.to_string(),
                build: build.identifier().to_string(),
                source,
            })?;

        Ok(StepCommand {
            build: build.identifier().to_string(),
            kind,
            program: bin.to_string(),
            args,
            workdir: self.workdir.clone(),
        })
    }
}

/// Runner configuration, usually read from the `[runner]` settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Interpreter used for every step.
    pub bin: String,
    /// Base directory the step workdirs are resolved against.
    pub root: PathBuf,
    pub download: StepSpec,
    pub process: StepSpec,
    /// Abort the run on the first failing step.
    pub fail_fast: bool,
    /// Log commands without executing them.
    pub dry_run: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            bin: "python".to_string(),
            root: PathBuf::from("."),
            download: StepSpec::fauna_download(),
            process: StepSpec::augur_process(),
            fail_fast: false,
            dry_run: false,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn download(mut self, spec: StepSpec) -> Self {
        self.download = spec;
        self
    }

    pub fn process(mut self, spec: StepSpec) -> Self {
        self.process = spec;
        self
    }

    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn step(&self, kind: StepKind) -> &StepSpec {
        match kind {
            StepKind::Download => &self.download,
            StepKind::Process => &self.process,
        }
    }

    /// Render the command for one step of `build`, with the workdir
    /// resolved against [`RunnerConfig::root`].
    pub fn command_for(&self, kind: StepKind, build: &BuildConfig) -> RunnerResult<StepCommand> {
        let mut command = self.step(kind).render(&self.bin, kind, build)?;
        command.workdir = self.root.join(&command.workdir);
        Ok(command)
    }
}

/// A concrete step invocation for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCommand {
    pub build: String,
    pub kind: StepKind,
    pub program: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
}

impl StepCommand {
    /// Command line for logging.
    pub fn display(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in &self.args {
            if arg.contains(' ') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push(' ');
                cmd.push_str(arg);
            }
        }
        cmd
    }
}
