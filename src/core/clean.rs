use serde::Serialize;

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::output::{StatusLine, StatusReport};
use crate::utils::io;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanOutput {
    pub command: String,
    pub build_dir: String,
    pub removed: bool,
}

/// Remove the build directory recursively. No-op when it does not exist.
pub fn clean(config: &ProjectConfig) -> Result<CleanOutput> {
    let build_dir = config.build_path();
    let removed = if build_dir.exists() {
        io::remove_dir_all(&build_dir)?;
        log_status!("clean", "Removed {}", build_dir.display());
        true
    } else {
        false
    };

    Ok(CleanOutput {
        command: "clean".to_string(),
        build_dir: build_dir.display().to_string(),
        removed,
    })
}

impl StatusReport for CleanOutput {
    fn title(&self) -> &str {
        "clean"
    }

    fn lines(&self) -> Vec<StatusLine> {
        if self.removed {
            vec![StatusLine::ok(format!("removed {}", self.build_dir))]
        } else {
            vec![StatusLine::info(format!(
                "{} does not exist, nothing to clean",
                self.build_dir
            ))]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clean_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::with_root(dir.path());
        std::fs::create_dir_all(dir.path().join("build/CMakeFiles")).unwrap();
        std::fs::write(dir.path().join("build/CMakeCache.txt"), "cache").unwrap();

        let first = clean(&config).unwrap();
        assert!(first.removed);
        assert!(!dir.path().join("build").exists());

        let second = clean(&config).unwrap();
        assert!(!second.removed);
        assert!(second.lines()[0].message.contains("does not exist"));
    }

    #[test]
    fn clean_leaves_sources_alone() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::with_root(dir.path());
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.cpp"), "int main() {}").unwrap();
        std::fs::create_dir_all(dir.path().join("build")).unwrap();

        clean(&config).unwrap();

        assert!(dir.path().join("src/main.cpp").exists());
    }
}
