//! The analyze → render → cleanup pipeline.
//!
//! Steps run strictly in order and each one only starts after the previous
//! step succeeded. The descriptor lives in a per-run scratch directory so
//! concurrent runs never share a file name.

use serde::Serialize;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{self, CommandOutput};
use crate::defaults::{Defaults, ToolConfig};
use crate::error::{Error, PipelineStepFailedDetails, Result};
use crate::paths;
use crate::template::{self, TemplateVars};
use crate::validation;

/// Everything one pipeline run needs, fully resolved.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    /// Absolute path of the analyzed source file
    pub source: PathBuf,
    /// Output image path as given by the invoker (tilde-expanded)
    pub output: PathBuf,
    pub format: String,
    pub analyzer: ToolConfig,
    pub renderer: ToolConfig,
    pub descriptor_name: String,
    pub cleanup_on_failure: bool,
    /// Per-run scratch directory, created by the run
    pub scratch_dir: PathBuf,
}

/// Per-invocation overrides layered on top of [`Defaults`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source: Option<String>,
    pub format: Option<String>,
    pub cleanup_on_failure: bool,
}

impl PipelineSpec {
    pub fn resolve(defaults: &Defaults, output: &str, overrides: &Overrides) -> Result<Self> {
        // Checked for emptiness only; the path itself is passed through untouched
        validation::require_non_empty(output, "output", "Output path cannot be empty")?;
        let format = validation::require_token(
            overrides.format.as_deref().unwrap_or(&defaults.format),
            "format",
            &["png", "svg", "pdf"],
        )?;
        let source = overrides.source.as_deref().unwrap_or(&defaults.source);
        let source = validation::require_non_empty(source, "source", "Source path cannot be empty")?;
        let descriptor_name = require_plain_file_name(&defaults.descriptor_name)?;

        defaults.analyzer.validate("analyzer")?;
        defaults.renderer.validate("renderer")?;

        Ok(Self {
            source: paths::absolutize(source)?,
            output: paths::expand(output),
            format: format.to_string(),
            analyzer: defaults.analyzer.clone(),
            renderer: defaults.renderer.clone(),
            descriptor_name: descriptor_name.to_string(),
            cleanup_on_failure: defaults.cleanup_on_failure || overrides.cleanup_on_failure,
            scratch_dir: paths::scratch_dir(),
        })
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.scratch_dir.join(&self.descriptor_name)
    }
}

/// The descriptor must land inside the scratch directory, so its name may not
/// carry directory components.
fn require_plain_file_name(name: &str) -> Result<&str> {
    let name = validation::require_non_empty(
        name,
        "descriptor_name",
        "Descriptor file name cannot be empty",
    )?;

    if Path::new(name).file_name() != Some(OsStr::new(name)) {
        return Err(Error::config_invalid_value(
            "descriptor_name",
            Some(name.to_string()),
            "Descriptor file name must not contain path separators",
        ));
    }
    Ok(name)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Analyze,
    Render,
    Cleanup,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Analyze => "analyze",
            StepId::Render => "render",
            StepId::Cleanup => "cleanup",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRunStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStepResult {
    pub id: StepId,
    pub status: PipelineRunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl PipelineStepResult {
    fn skipped(id: StepId) -> Self {
        Self {
            id,
            status: PipelineRunStatus::Skipped,
            command: None,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn from_output(id: StepId, command: String, output: CommandOutput) -> Self {
        Self {
            id,
            status: if output.success {
                PipelineRunStatus::Success
            } else {
                PipelineRunStatus::Failed
            },
            command: Some(command),
            exit_code: Some(output.exit_code),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunResult {
    pub status: PipelineRunStatus,
    pub source: String,
    pub output: String,
    pub format: String,
    pub descriptor: String,
    /// False when the descriptor was left on disk after a failed render
    pub descriptor_removed: bool,
    pub steps: Vec<PipelineStepResult>,
}

impl PipelineRunResult {
    /// The first failed step. Cleanup after a failed render does not mask the
    /// render failure.
    pub fn failed_step(&self) -> Option<&PipelineStepResult> {
        self.steps
            .iter()
            .find(|step| step.status == PipelineRunStatus::Failed)
    }

    pub fn step(&self, id: StepId) -> Option<&PipelineStepResult> {
        self.steps.iter().find(|step| step.id == id)
    }
}

/// Run the pipeline and turn a failed step into `pipeline.step_failed`.
pub fn run(spec: &PipelineSpec) -> Result<PipelineRunResult> {
    let result = execute(spec)?;

    let descriptor_left =
        !result.descriptor_removed && Path::new(&result.descriptor).exists();

    match result.failed_step() {
        None => Ok(result),
        Some(step) => Err(Error::pipeline_step_failed(PipelineStepFailedDetails {
            step: step.id.as_str().to_string(),
            command: step.command.clone().unwrap_or_default(),
            exit_code: step.exit_code.filter(|code| *code != 0).unwrap_or(1),
            stdout: step.stdout.clone(),
            stderr: step.stderr.clone(),
            descriptor_path: descriptor_left.then(|| result.descriptor.clone()),
        })),
    }
}

/// Run every step that its predecessors allow and report each outcome.
///
/// Only setup problems (scratch directory creation) are returned as errors;
/// step failures are recorded in the returned trace.
pub fn execute(spec: &PipelineSpec) -> Result<PipelineRunResult> {
    fs::create_dir_all(&spec.scratch_dir).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("create {}", spec.scratch_dir.display())),
        )
    })?;

    let descriptor = spec.descriptor_path();
    let source = paths::display(&spec.source);
    let output = paths::display(&spec.output);
    let descriptor_str = paths::display(&descriptor);
    let workdir = paths::display(&spec.scratch_dir);
    let vars = [
        (TemplateVars::SOURCE, source.as_str()),
        (TemplateVars::DESCRIPTOR, descriptor_str.as_str()),
        (TemplateVars::OUTPUT, output.as_str()),
        (TemplateVars::FORMAT, spec.format.as_str()),
        (TemplateVars::WORKDIR, workdir.as_str()),
    ];

    let mut steps = Vec::with_capacity(3);
    let mut descriptor_removed = false;

    let analyze = run_tool(StepId::Analyze, &spec.analyzer, &vars, Some(&spec.scratch_dir));
    let analyzed = analyze.status == PipelineRunStatus::Success;
    steps.push(analyze);

    if !analyzed {
        // Only an empty scratch dir is removed; whatever the analyzer wrote stays
        if fs::remove_dir(&spec.scratch_dir).is_ok() {
            descriptor_removed = true;
        }
        steps.push(PipelineStepResult::skipped(StepId::Render));
        steps.push(PipelineStepResult::skipped(StepId::Cleanup));
        return Ok(finish(spec, descriptor_str, descriptor_removed, steps));
    }

    let render = run_tool(StepId::Render, &spec.renderer, &vars, None);
    let rendered = render.status == PipelineRunStatus::Success;
    steps.push(render);

    if rendered || spec.cleanup_on_failure {
        let cleanup = cleanup_scratch(&spec.scratch_dir);
        descriptor_removed = cleanup.status == PipelineRunStatus::Success;
        steps.push(cleanup);
    } else {
        crate::log_status!("cleanup", "Keeping descriptor at {}", descriptor_str);
        steps.push(PipelineStepResult::skipped(StepId::Cleanup));
    }

    Ok(finish(spec, descriptor_str, descriptor_removed, steps))
}

fn finish(
    spec: &PipelineSpec,
    descriptor: String,
    descriptor_removed: bool,
    steps: Vec<PipelineStepResult>,
) -> PipelineRunResult {
    let status = if steps
        .iter()
        .any(|step| step.status == PipelineRunStatus::Failed)
    {
        PipelineRunStatus::Failed
    } else {
        PipelineRunStatus::Success
    };

    PipelineRunResult {
        status,
        source: paths::display(&spec.source),
        output: paths::display(&spec.output),
        format: spec.format.clone(),
        descriptor,
        descriptor_removed,
        steps,
    }
}

fn run_tool(
    id: StepId,
    tool: &ToolConfig,
    vars: &[(&str, &str)],
    current_dir: Option<&Path>,
) -> PipelineStepResult {
    let args = template::render_all(&tool.args, vars);
    let display = command::display_command(&tool.program, &args);

    match id {
        StepId::Analyze => crate::log_status!("analyze", "{}", display),
        _ => crate::log_status!("render", "{}", display),
    }

    let output = command::execute(&tool.program, &args, current_dir);
    PipelineStepResult::from_output(id, display, output)
}

fn cleanup_scratch(scratch_dir: &Path) -> PipelineStepResult {
    let command = format!("rm -r {}", paths::display(scratch_dir));
    crate::log_status!("cleanup", "Removing {}", paths::display(scratch_dir));

    let output = match fs::remove_dir_all(scratch_dir) {
        Ok(()) => CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        },
        Err(e) => CommandOutput {
            stdout: String::new(),
            stderr: e.to_string(),
            success: false,
            exit_code: 1,
        },
    };

    PipelineStepResult::from_output(StepId::Cleanup, command, output)
}
