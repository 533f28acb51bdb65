//! Source file discovery for the migration walk.

use std::path::{Path, PathBuf};

/// Directories to always skip at any depth (dependency/VCS directories).
const ALWAYS_SKIP_DIRS: &[&str] = &["node_modules", ".git", ".svn", ".hg"];

/// Walk `root` for files whose extension is in `extensions`, skipping VCS
/// directories and the `excluded` directories. Symlinked files are included;
/// symlinked directories are not followed.
///
/// Results are sorted so runs are reproducible.
pub fn collect(root: &Path, extensions: &[String], excluded: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_recursive(root, extensions, excluded, &mut files);
    files.sort();
    files
}

fn walk_recursive(dir: &Path, extensions: &[String], excluded: &[PathBuf], files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            if ALWAYS_SKIP_DIRS.contains(&name.as_str()) {
                continue;
            }
            if excluded.iter().any(|ex| ex == &path) {
                continue;
            }
            walk_recursive(&path, extensions, excluded, files);
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.trim_start_matches('.') == ext));
            if matches {
                files.push(path);
            }
        }
    }
}
