//! Test executable discovery and execution.
//!
//! Discovery order:
//! 1. An explicitly named test in the build directory.
//! 2. Every executable in the build directory matching `<prefix>*`.
//! 3. The conventional fallback executable (`tests`).

use glob_match::glob_match;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::output::{BulkResult, BulkSummary, ItemOutcome, StatusLine, StatusReport};
use crate::utils::command;

const EXE_SUFFIX: &str = std::env::consts::EXE_SUFFIX;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub path: String,
    pub passed: bool,
    pub exit_code: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutput {
    pub command: String,
    /// How the executables were found: `named`, `pattern` or `fallback`.
    pub discovery: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
    #[serde(flatten)]
    pub runs: BulkResult<TestRun>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Named(PathBuf),
    Pattern(Vec<PathBuf>),
    Fallback(PathBuf),
}

impl Discovery {
    fn label(&self) -> &'static str {
        match self {
            Discovery::Named(_) => "named",
            Discovery::Pattern(_) => "pattern",
            Discovery::Fallback(_) => "fallback",
        }
    }

    fn into_paths(self) -> Vec<PathBuf> {
        match self {
            Discovery::Named(p) | Discovery::Fallback(p) => vec![p],
            Discovery::Pattern(paths) => paths,
        }
    }
}

fn with_exe_suffix(name: &str) -> String {
    if EXE_SUFFIX.is_empty() || name.ends_with(EXE_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, EXE_SUFFIX)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Find test executables in the build directory.
pub fn discover(config: &ProjectConfig, name: Option<&str>) -> Result<Discovery> {
    let build_dir = config.build_path();

    if let Some(name) = name {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(Error::validation_invalid_argument(
                "test",
                "test name must be a file name inside the build directory",
                Some(name.to_string()),
            ));
        }
        return Ok(Discovery::Named(build_dir.join(with_exe_suffix(name))));
    }

    let pattern = format!("{}*{}", config.tests.prefix, EXE_SUFFIX);
    let mut found = Vec::new();
    if let Ok(entries) = std::fs::read_dir(&build_dir) {
        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !glob_match(&pattern, &file_name) {
                continue;
            }
            let path = entry.path();
            if is_executable(&path) {
                found.push(path);
            }
        }
    }
    found.sort();

    if found.is_empty() {
        Ok(Discovery::Fallback(
            build_dir.join(with_exe_suffix(&config.tests.fallback)),
        ))
    } else {
        Ok(Discovery::Pattern(found))
    }
}

/// Run every discovered test executable, never stopping on a failure.
pub fn run(config: &ProjectConfig, name: Option<&str>) -> Result<TestOutput> {
    let discovery = discover(config, name)?;
    let label = discovery.label().to_string();
    let paths = discovery.into_paths();

    let mut output = TestOutput {
        command: "test".to_string(),
        discovery: label,
        success: false,
        missing: None,
        runs: BulkResult {
            action: "test".to_string(),
            results: Vec::new(),
            summary: BulkSummary::default(),
        },
    };

    if let [only] = paths.as_slice() {
        if !only.is_file() {
            output.missing = Some(only.display().to_string());
            return Ok(output);
        }
    }

    for path in paths {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let display = path.display().to_string();

        log_status!("test", "Running {}", id);
        match command::run_passthrough(&display, &[], Some(&config.build_path())) {
            Ok(exit_code) => {
                let passed = exit_code == 0;
                output.runs.summary.record(passed);
                output.runs.results.push(ItemOutcome {
                    id,
                    result: Some(TestRun {
                        path: display,
                        passed,
                        exit_code,
                    }),
                    error: None,
                });
            }
            Err(e) => {
                output.runs.summary.record(false);
                output.runs.results.push(ItemOutcome {
                    id,
                    result: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    output.success = output.runs.summary.total > 0 && output.runs.summary.all_succeeded();
    Ok(output)
}

impl StatusReport for TestOutput {
    fn title(&self) -> &str {
        "unit tests"
    }

    fn lines(&self) -> Vec<StatusLine> {
        if let Some(missing) = &self.missing {
            return vec![StatusLine::fail(format!(
                "test executable not found at {}, build the tests first",
                missing
            ))];
        }

        let mut lines: Vec<StatusLine> = self
            .runs
            .results
            .iter()
            .map(|item| match (&item.result, &item.error) {
                (Some(run), _) if run.passed => StatusLine::ok(format!("{} passed", item.id)),
                (Some(run), _) => StatusLine::fail(format!(
                    "{} failed (exit code {})",
                    item.id, run.exit_code
                )),
                (None, Some(err)) => StatusLine::fail(format!("{}: {}", item.id, err)),
                (None, None) => StatusLine::fail(format!("{} did not run", item.id)),
            })
            .collect();

        let summary = &self.runs.summary;
        if self.success {
            lines.push(StatusLine::ok(format!("all {} test executable(s) passed", summary.total)));
        } else {
            lines.push(StatusLine::fail(format!(
                "{} of {} test executable(s) failed",
                summary.failed, summary.total
            )));
        }
        lines
    }
}
