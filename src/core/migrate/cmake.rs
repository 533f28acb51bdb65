//! CMakeLists.txt edit: SDL2 package references become SDL3.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::Result;
use crate::utils::io;

// SDL3's CMake package exports the singular variable names.
static INCLUDE_DIRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SDL3_INCLUDE_DIRS").unwrap());

static LIBRARIES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"SDL3_LIBRARIES").unwrap());

/// Rewrite CMake text: every `SDL2` token becomes `SDL3`, then the renamed
/// include/library variables are fixed up.
pub fn rewrite(content: &str) -> String {
    let renamed = content.replace("SDL2", "SDL3");
    let renamed = INCLUDE_DIRS.replace_all(&renamed, "SDL3_INCLUDE_DIR");
    LIBRARIES.replace_all(&renamed, "SDL3_LIBRARY").into_owned()
}

/// Outcome of editing the build configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmakeEdit {
    Missing,
    Unchanged,
    Updated,
}

/// Rewrite the file in place. Only writes when the content changes.
pub fn edit_file(path: &Path, dry_run: bool) -> Result<CmakeEdit> {
    if !path.is_file() {
        return Ok(CmakeEdit::Missing);
    }

    let content = io::read_file(path, &format!("read {}", path.display()))?;
    let updated = rewrite(&content);
    if updated == content {
        return Ok(CmakeEdit::Unchanged);
    }

    if !dry_run {
        io::write_file(path, &updated, &format!("write {}", path.display()))?;
        log_status!("migrate", "Updated {}", path.display());
    }
    Ok(CmakeEdit::Updated)
}
