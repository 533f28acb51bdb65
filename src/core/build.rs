use serde::Serialize;
use std::path::Path;

use crate::check::{self, CheckReport};
use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::output::{StatusLine, StatusReport};
use crate::utils::command::{self, CommandOutput};
use crate::utils::io;

// === Options ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildProfile::Debug => "Debug",
            BuildProfile::Release => "Release",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Parallel job count passed to `cmake --build --parallel`.
    pub jobs: Option<usize>,
    /// `CMAKE_BUILD_TYPE`; left to the project default when `None`.
    pub profile: Option<BuildProfile>,
}

impl BuildOptions {
    pub fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(Error::validation_invalid_argument(
                "jobs",
                "must be at least 1",
                Some("0".to_string()),
            ));
        }
        Ok(())
    }
}

/// Whether child output streams to the terminal or is captured for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Passthrough,
    Captured,
}

// === Steps ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStep {
    Configure,
    Compile,
}

impl BuildStep {
    fn label(&self) -> &'static str {
        match self {
            BuildStep::Configure => "cmake configure",
            BuildStep::Compile => "build",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: BuildStep,
    pub command: String,
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<CommandOutput>,
}

/// `cmake -G <generator> [-DCMAKE_BUILD_TYPE=...] <root>`
pub fn configure_args(config: &ProjectConfig, options: &BuildOptions) -> Vec<String> {
    let mut args = vec!["-G".to_string(), config.generator.clone()];
    if let Some(profile) = options.profile {
        args.push(format!("-DCMAKE_BUILD_TYPE={}", profile.as_str()));
    }
    args.push(config.root.display().to_string());
    args
}

/// `cmake --build . [--config <profile>] [--parallel N]`
pub fn compile_args(options: &BuildOptions) -> Vec<String> {
    let mut args = vec!["--build".to_string(), ".".to_string()];
    if let Some(profile) = options.profile {
        args.push("--config".to_string());
        args.push(profile.as_str().to_string());
    }
    if let Some(jobs) = options.jobs {
        args.push("--parallel".to_string());
        args.push(jobs.to_string());
    }
    args
}

fn run_step(
    config: &ProjectConfig,
    step: BuildStep,
    args: Vec<String>,
    build_dir: &Path,
    mode: OutputMode,
) -> StepOutcome {
    let program = &config.tools.cmake;
    let display = command::display(program, &args);
    log_status!("build", "{}", display);

    let result = match mode {
        OutputMode::Passthrough => command::run_passthrough(program, &args, Some(build_dir))
            .map(|code| (code, None)),
        OutputMode::Captured => command::run_captured(program, &args, Some(build_dir))
            .map(|out| (out.exit_code, Some(out))),
    };

    match result {
        Ok((exit_code, output)) => StepOutcome {
            step,
            command: display,
            success: exit_code == 0,
            exit_code,
            error: None,
            output,
        },
        Err(e) => StepOutcome {
            step,
            command: display,
            success: false,
            exit_code: -1,
            error: Some(e.to_string()),
            output: None,
        },
    }
}

// === Public API ===

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub command: String,
    pub build_dir: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<BuildProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Environment check that gated the build, when one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckReport>,
    pub steps: Vec<StepOutcome>,
}

impl BuildOutput {
    pub fn failed_step(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| !s.success)
    }
}

/// Check the environment, then configure and compile.
///
/// A failed environment check means no build is attempted. Returns exit code
/// 1 only when a build step fails.
pub fn run(config: &ProjectConfig, options: &BuildOptions) -> Result<(BuildOutput, i32)> {
    options.validate()?;

    let report = check::check(config);
    if !report.success {
        let output = BuildOutput {
            command: "build".to_string(),
            build_dir: config.build_path().display().to_string(),
            success: false,
            profile: options.profile,
            jobs: options.jobs,
            check: Some(report),
            steps: Vec::new(),
        };
        return Ok((output, 0));
    }

    let mut output = configure_and_build(config, options, OutputMode::Passthrough)?;
    output.check = Some(report);
    let exit_code = if output.success { 0 } else { 1 };
    Ok((output, exit_code))
}

/// Create the build directory if needed and run the configure and compile
/// steps. Stops after the first failing step.
pub fn configure_and_build(
    config: &ProjectConfig,
    options: &BuildOptions,
    mode: OutputMode,
) -> Result<BuildOutput> {
    let build_dir = config.build_path();
    if !build_dir.exists() {
        io::create_dir_all(&build_dir)?;
    }

    let mut steps = Vec::with_capacity(2);

    let configure = run_step(
        config,
        BuildStep::Configure,
        configure_args(config, options),
        &build_dir,
        mode,
    );
    let configured = configure.success;
    steps.push(configure);

    if configured {
        steps.push(run_step(
            config,
            BuildStep::Compile,
            compile_args(options),
            &build_dir,
            mode,
        ));
    }

    let success = steps.len() == 2 && steps.iter().all(|s| s.success);

    Ok(BuildOutput {
        command: "build".to_string(),
        build_dir: build_dir.display().to_string(),
        success,
        profile: options.profile,
        jobs: options.jobs,
        check: None,
        steps,
    })
}

/// Format a failed step with context from captured stderr/stdout.
pub fn format_step_failure(step: &StepOutcome) -> String {
    let mut msg = match &step.error {
        Some(err) => format!("{} failed: {}", step.step.label(), err),
        None => format!("{} failed (exit code {})", step.step.label(), step.exit_code),
    };

    if let Some(output) = &step.output {
        let tail = command::tail_lines(output.error_text(), 15);
        if !tail.is_empty() {
            msg.push_str("\n--- output (last 15 lines) ---\n");
            msg.push_str(&tail);
            msg.push_str("\n--- end of output ---");
        }
    }

    msg
}

impl StatusReport for BuildOutput {
    fn title(&self) -> &str {
        "build"
    }

    fn lines(&self) -> Vec<StatusLine> {
        let mut lines = self
            .check
            .as_ref()
            .map(|c| c.lines())
            .unwrap_or_default();

        if let Some(check) = &self.check {
            if !check.success {
                lines.push(StatusLine::fail("environment check failed, build skipped"));
                return lines;
            }
        }

        match self.failed_step() {
            Some(step) => lines.push(StatusLine::fail(format_step_failure(step))),
            None if self.success => lines.push(StatusLine::ok("build succeeded")),
            None => lines.push(StatusLine::fail("build did not complete")),
        }

        lines
    }
}
