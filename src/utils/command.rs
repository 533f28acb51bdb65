//! Command execution primitives with consistent error handling.
//!
//! Every helper runs the program directly (no shell) and blocks until it exits.

use serde::Serialize;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Captured output from command execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Diagnostic text: stderr, falling back to stdout when stderr is empty.
    pub fn error_text(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Check whether `program args...` can be spawned and exits successfully.
///
/// Output is discarded. Used for `--version` style availability probes.
pub fn probe(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a command and capture stdout/stderr.
///
/// A non-zero exit is not an error; it is reported through `success`/`exit_code`.
/// Failing to spawn the program is an error.
pub fn run_captured(program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let out = cmd
        .output()
        .map_err(|e| Error::process_spawn_failed(program, e.to_string()))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&out.stdout).to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        success: out.status.success(),
        exit_code: out.status.code().unwrap_or(-1),
    })
}

/// Run a command with stdin/stdout/stderr passed through to the terminal.
/// Returns only the exit code (`-1` when terminated by a signal).
pub fn run_passthrough(program: &str, args: &[String], dir: Option<&Path>) -> Result<i32> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let status = cmd
        .status()
        .map_err(|e| Error::process_spawn_failed(program, e.to_string()))?;

    Ok(status.code().unwrap_or(-1))
}

/// Render a command line for reports, e.g. `cmake -G "Unix Makefiles" ..`.
pub fn display(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    for arg in args {
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            parts.push(format!("\"{}\"", arg));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// Last `n` lines of `text`, joined with newlines.
pub fn tail_lines(text: &str, n: usize) -> String {
    let tail: Vec<&str> = text.lines().rev().take(n).collect();
    tail.into_iter().rev().collect::<Vec<_>>().join("\n")
}
