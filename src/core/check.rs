//! Environment check: required tools and optional dependencies.

use serde::Serialize;
use std::env;
use std::path::PathBuf;

use crate::config::{DependencyConfig, ProjectConfig};
use crate::output::{StatusLine, StatusReport};
use crate::utils::command;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCheck {
    pub tool: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCheck {
    pub name: String,
    pub path: String,
    pub found: bool,
    /// Where the dependency was found when it came from the `INCLUDE` path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_via_include: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub command: String,
    pub success: bool,
    pub tools: Vec<ToolCheck>,
    pub dependencies: Vec<DependencyCheck>,
}

impl CheckReport {
    pub fn missing_tools(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|t| !t.available)
            .map(|t| t.tool.as_str())
            .collect()
    }
}

/// Verify the compiler and cmake respond to `--version`, then look for the
/// optional dependencies.
///
/// A missing tool fails the check and stops further probing. Missing
/// dependencies are reported as warnings and never fail the check.
pub fn check(config: &ProjectConfig) -> CheckReport {
    let mut tools = Vec::new();

    for tool in [&config.tools.compiler, &config.tools.cmake] {
        let available = command::probe(tool, &["--version"]);
        log_status!("check", "{} {}", tool, if available { "available" } else { "missing" });
        tools.push(ToolCheck {
            tool: tool.clone(),
            available,
        });
        if !available {
            return CheckReport {
                command: "check".to_string(),
                success: false,
                tools,
                dependencies: Vec::new(),
            };
        }
    }

    let include_dirs = include_dirs();
    let dependencies = config
        .dependencies
        .iter()
        .map(|dep| check_dependency(config, dep, &include_dirs))
        .collect();

    CheckReport {
        command: "check".to_string(),
        success: true,
        tools,
        dependencies,
    }
}

fn check_dependency(
    config: &ProjectConfig,
    dep: &DependencyConfig,
    include_dirs: &[PathBuf],
) -> DependencyCheck {
    let path = config.dependency_path(dep);
    let mut result = DependencyCheck {
        name: dep.name.clone(),
        path: path.display().to_string(),
        found: path.exists(),
        found_via_include: None,
    };

    if !result.found {
        if let Some(hint) = &dep.include_hint {
            if let Some(dir) = include_dirs.iter().find(|d| d.join(hint).exists()) {
                result.found = true;
                result.found_via_include = Some(dir.display().to_string());
            }
        }
    }

    result
}

/// Directories listed on the `INCLUDE` environment variable.
fn include_dirs() -> Vec<PathBuf> {
    env::var_os("INCLUDE")
        .map(|raw| {
            env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl StatusReport for CheckReport {
    fn title(&self) -> &str {
        "environment check"
    }

    fn lines(&self) -> Vec<StatusLine> {
        let mut lines = Vec::new();

        for tool in &self.tools {
            if tool.available {
                lines.push(StatusLine::ok(format!("{} available", tool.tool)));
            } else {
                lines.push(StatusLine::fail(format!(
                    "{} not available, install it and make sure it is on PATH",
                    tool.tool
                )));
            }
        }

        for dep in &self.dependencies {
            match (&dep.found_via_include, dep.found) {
                (Some(dir), _) => {
                    lines.push(StatusLine::ok(format!("{} found on INCLUDE ({})", dep.name, dir)))
                }
                (None, true) => lines.push(StatusLine::ok(format!("{} found", dep.name))),
                (None, false) => lines.push(StatusLine::warn(format!(
                    "{} not found at {} (optional)",
                    dep.name, dep.path
                ))),
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::StatusLevel;
    use tempfile::TempDir;

    fn config_with_tools(root: &std::path::Path, compiler: &str, cmake: &str) -> ProjectConfig {
        let mut config = ProjectConfig::with_root(root);
        config.tools.compiler = compiler.to_string();
        config.tools.cmake = cmake.to_string();
        config
    }

    #[test]
    fn missing_compiler_fails_and_skips_remaining_checks() {
        let dir = TempDir::new().unwrap();
        let config = config_with_tools(dir.path(), "nonexistent_gxx_xyz", "echo");

        let report = check(&config);

        assert!(!report.success);
        assert_eq!(report.missing_tools(), vec!["nonexistent_gxx_xyz"]);
        assert_eq!(report.tools.len(), 1);
        assert!(report.dependencies.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn missing_cmake_fails_even_when_dependencies_exist() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("deps/googletest")).unwrap();
        let config = config_with_tools(dir.path(), "echo", "nonexistent_cmake_xyz");

        let report = check(&config);

        assert!(!report.success);
        assert_eq!(report.missing_tools(), vec!["nonexistent_cmake_xyz"]);
    }

    #[cfg(unix)]
    #[test]
    fn missing_dependencies_are_only_warnings() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("deps/googletest")).unwrap();
        let config = config_with_tools(dir.path(), "echo", "echo");

        let report = check(&config);

        assert!(report.success);
        let gtest = report
            .dependencies
            .iter()
            .find(|d| d.name == "googletest")
            .unwrap();
        assert!(gtest.found);

        let warnings = report
            .lines()
            .into_iter()
            .filter(|l| l.level == StatusLevel::Warn)
            .count();
        assert!(warnings >= 1);
    }

    #[test]
    fn include_hint_satisfies_header_dependency() {
        let dir = TempDir::new().unwrap();
        let include = dir.path().join("include");
        std::fs::create_dir_all(include.join("SDL3")).unwrap();
        std::fs::write(include.join("SDL3/SDL.h"), "").unwrap();

        let config = ProjectConfig::with_root(dir.path());
        let dep = &config.dependencies[0];
        let result = check_dependency(&config, dep, &[include.clone()]);

        assert!(result.found);
        assert_eq!(result.found_via_include, Some(include.display().to_string()));
    }
}
