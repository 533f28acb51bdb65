//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Read file contents with standardized error handling.
///
/// Wraps `fs::read_to_string` with consistent `Error::internal_io` formatting.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Read raw bytes with standardized error handling.
pub fn read_bytes(path: &Path, operation: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Write content to file with standardized error handling.
///
/// Wraps `fs::write` with consistent `Error::internal_io` formatting.
pub fn write_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// Readers always see either the old content or the new content, never a
/// partial write. A symlink is written through to its target, and an
/// existing file keeps its permissions.
pub fn write_file_atomic(path: &Path, content: &[u8], operation: &str) -> Result<()> {
    let is_symlink = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    let resolved = if is_symlink {
        fs::canonicalize(path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("{} (resolve link)", operation)))
        })?
    } else {
        path.to_path_buf()
    };
    let path = resolved.as_path();

    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    if let Ok(meta) = fs::metadata(path) {
        if let Err(e) = fs::set_permissions(&tmp_path, meta.permissions()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::internal_io(
                e.to_string(),
                Some(format!("{} (permissions)", operation)),
            ));
        }
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation)))
    })?;

    Ok(())
}

/// Copy `from` to `to`, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(from, to).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("copy {} -> {}", from.display(), to.display())),
        )
    })
}

pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("create {}", path.display()))))
}

pub fn remove_dir_all(path: &Path) -> Result<()> {
    fs::remove_dir_all(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("remove {}", path.display()))))
}

/// Lowercase hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
