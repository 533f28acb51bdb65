use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

/// Config file looked up in the project root when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "sdlmgr.json";

/// Immutable project configuration, built once at process entry and passed
/// to every operation.
///
/// Every field has a serde default, so a missing or partial `sdlmgr.json`
/// still produces a complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root. Not read from the file; attached by [`ProjectConfig::load`].
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    #[serde(default = "default_generator")]
    pub generator: String,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default = "default_dependencies")]
    pub dependencies: Vec<DependencyConfig>,

    #[serde(default)]
    pub tests: TestsConfig,

    #[serde(default)]
    pub migration: MigrationConfig,
}

/// External tools probed by `check` and invoked by `build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_compiler")]
    pub compiler: String,

    #[serde(default = "default_cmake")]
    pub cmake: String,
}

/// An optional dependency expected somewhere under the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    pub name: String,
    /// Path relative to the project root (or absolute, `~` allowed).
    pub path: String,
    /// Header looked up on the `INCLUDE` search path when `path` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestsConfig {
    #[serde(default = "default_test_prefix")]
    pub prefix: String,

    #[serde(default = "default_test_fallback")]
    pub fallback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    #[serde(default = "default_cmake_file")]
    pub cmake_file: String,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directories (relative to the root) the source walk never enters.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    #[serde(default = "default_header_from")]
    pub header_from: String,

    #[serde(default = "default_header_to")]
    pub header_to: String,

    /// Extra regex rules appended after the built-in SDL3 rules.
    #[serde(default)]
    pub extra_rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub replacement: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            cmake: default_cmake(),
        }
    }
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            prefix: default_test_prefix(),
            fallback: default_test_fallback(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            cmake_file: default_cmake_file(),
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
            header_from: default_header_from(),
            header_to: default_header_to(),
            extra_rules: Vec::new(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_project_name() -> String {
    "gomoku-sdl2".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_generator() -> String {
    if cfg!(windows) {
        "MinGW Makefiles".to_string()
    } else {
        "Unix Makefiles".to_string()
    }
}

fn default_compiler() -> String {
    "g++".to_string()
}

fn default_cmake() -> String {
    "cmake".to_string()
}

fn default_dependencies() -> Vec<DependencyConfig> {
    vec![
        DependencyConfig {
            name: "SDL3 headers".to_string(),
            path: "deps/SDL3/include/SDL3/SDL.h".to_string(),
            include_hint: Some("SDL3/SDL.h".to_string()),
        },
        DependencyConfig {
            name: "SDL3 libraries".to_string(),
            path: "deps/SDL3/lib".to_string(),
            include_hint: None,
        },
        DependencyConfig {
            name: "SDL3_ttf headers".to_string(),
            path: "deps/SDL3_ttf/include/SDL3_ttf/SDL_ttf.h".to_string(),
            include_hint: Some("SDL3_ttf/SDL_ttf.h".to_string()),
        },
        DependencyConfig {
            name: "googletest".to_string(),
            path: "deps/googletest".to_string(),
            include_hint: None,
        },
    ]
}

fn default_test_prefix() -> String {
    "test_".to_string()
}

fn default_test_fallback() -> String {
    "tests".to_string()
}

fn default_backup_dir() -> String {
    "sdl2_backup".to_string()
}

fn default_cmake_file() -> String {
    "CMakeLists.txt".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["h".to_string(), "cpp".to_string(), "c".to_string()]
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["deps".to_string()]
}

fn default_header_from() -> String {
    "#include <SDL2/SDL.h>".to_string()
}

fn default_header_to() -> String {
    "#include <SDL3/SDL.h>".to_string()
}

// =============================================================================
// Loading
// =============================================================================

impl ProjectConfig {
    /// Built-in configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            project_name: default_project_name(),
            build_dir: default_build_dir(),
            generator: default_generator(),
            tools: ToolsConfig::default(),
            dependencies: default_dependencies(),
            tests: TestsConfig::default(),
            migration: MigrationConfig::default(),
        }
    }

    /// Load configuration for `root`.
    ///
    /// Reads `explicit` when given (it must exist), otherwise `root/sdlmgr.json`
    /// when present, otherwise falls back to the built-in defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                candidate.is_file().then_some(candidate)
            }
        };

        let mut config = match path {
            Some(path) => {
                let raw = io::read_file(&path, &format!("read {}", path.display()))?;
                let parsed: ProjectConfig = serde_json::from_str(&raw)
                    .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
                log_status!("config", "Loaded {}", path.display());
                parsed
            }
            None => Self::with_root(root),
        };

        // Children run from inside the build directory, so a relative root
        // would resolve against the wrong place.
        config.root = std::path::absolute(root).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("resolve {}", root.display())))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.project_name.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "project_name",
                None,
                "must not be empty",
            ));
        }
        if self.build_dir.trim().is_empty() {
            return Err(Error::config_invalid_value("build_dir", None, "must not be empty"));
        }
        if self.migration.backup_dir.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "migration.backup_dir",
                None,
                "must not be empty",
            ));
        }
        if self.migration.header_from.is_empty() {
            return Err(Error::config_invalid_value(
                "migration.header_from",
                None,
                "must not be empty",
            ));
        }
        if let Some(ext) = self
            .migration
            .extensions
            .iter()
            .find(|e| e.trim().is_empty())
        {
            return Err(Error::config_invalid_value(
                "migration.extensions",
                Some(ext.clone()),
                "extensions must be non-empty",
            ));
        }
        Ok(())
    }

    /// Absolute build directory.
    pub fn build_path(&self) -> PathBuf {
        self.root.join(&self.build_dir)
    }

    /// Path of the game executable inside the build directory.
    pub fn executable_path(&self) -> PathBuf {
        self.build_path()
            .join(format!("{}{}", self.project_name, std::env::consts::EXE_SUFFIX))
    }

    pub fn backup_path(&self) -> PathBuf {
        self.root.join(&self.migration.backup_dir)
    }

    pub fn cmake_file_path(&self) -> PathBuf {
        self.root.join(&self.migration.cmake_file)
    }

    /// Resolve a dependency path: `~` is expanded, relative paths hang off the root.
    pub fn dependency_path(&self, dep: &DependencyConfig) -> PathBuf {
        let expanded = shellexpand::tilde(&dep.path);
        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::load(dir.path(), None).unwrap();

        assert_eq!(config.project_name, "gomoku-sdl2");
        assert_eq!(config.build_dir, "build");
        assert_eq!(config.tools.compiler, "g++");
        assert_eq!(config.migration.backup_dir, "sdl2_backup");
        assert_eq!(config.root, dir.path());
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let config = ProjectConfig::load(Path::new("."), None).unwrap();

        assert!(config.root.is_absolute());
        assert!(config.build_path().is_absolute());
        assert!(config.executable_path().is_absolute());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"project_name": "gomoku", "tools": {"cmake": "cmake3"}}"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.project_name, "gomoku");
        assert_eq!(config.tools.cmake, "cmake3");
        assert_eq!(config.tools.compiler, "g++");
        assert_eq!(config.dependencies.len(), 4);
        assert_eq!(config.migration.extensions, vec!["h", "cpp", "c"]);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

        let err = ProjectConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        let err = ProjectConfig::load(dir.path(), Some(&missing)).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn empty_build_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"build_dir": " "}"#).unwrap();

        let err = ProjectConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn executable_lives_in_build_dir() {
        let config = ProjectConfig::with_root("/work/gomoku");
        let exe = config.executable_path();
        assert!(exe.starts_with("/work/gomoku/build"));
        assert!(exe
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("gomoku-sdl2"));
    }

    #[test]
    fn relative_dependency_paths_hang_off_root() {
        let config = ProjectConfig::with_root("/work/gomoku");
        let dep = &config.dependencies[0];
        assert_eq!(
            config.dependency_path(dep),
            PathBuf::from("/work/gomoku/deps/SDL3/include/SDL3/SDL.h")
        );
    }
}
