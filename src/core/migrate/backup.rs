//! Pre-write snapshot of migrated files and the manifest used to restore them.
//!
//! Backups mirror the project layout under the backup directory. A path that
//! already has a backup is never copied again, so the backup always holds the
//! bytes from before the first migration.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::output::{BulkResult, BulkSummary, ItemOutcome, StatusLine, StatusReport};
use crate::utils::io;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub created_at: String,
    pub root: String,
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    fn new(root: &Path) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339(),
            root: root.display().to_string(),
            entries: Vec::new(),
        }
    }

    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

pub fn manifest_path(config: &ProjectConfig) -> PathBuf {
    config.backup_path().join(MANIFEST_FILE_NAME)
}

/// Read the manifest, `None` when no migration has been snapshotted yet.
pub fn load_manifest(config: &ProjectConfig) -> Result<Option<Manifest>> {
    let path = manifest_path(config);
    if !path.is_file() {
        return Ok(None);
    }

    let raw = io::read_file(&path, &format!("read {}", path.display()))?;
    let manifest = serde_json::from_str(&raw).map_err(|e| {
        Error::internal_json(e.to_string(), Some(format!("parse {}", path.display())))
    })?;
    Ok(Some(manifest))
}

fn save_manifest(config: &ProjectConfig, manifest: &Manifest) -> Result<()> {
    let path = manifest_path(config);
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize manifest".to_string())))?;
    io::write_file_atomic(&path, json.as_bytes(), "write backup manifest")
}

/// Manifest key for `path`: relative to the root, `/`-separated.
pub fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| {
        Error::internal_unexpected(format!(
            "{} is outside the project root {}",
            path.display(),
            root.display()
        ))
    })?;

    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub backup_dir: String,
    /// Files copied during this run.
    pub added: usize,
    /// Files that already had a backup and were left alone.
    pub kept: usize,
}

/// Copy every file in `files` into the backup directory and record it in the
/// manifest. Existing backups win over the current file contents.
pub fn snapshot(config: &ProjectConfig, files: &[PathBuf]) -> Result<SnapshotSummary> {
    let backup_dir = config.backup_path();
    let mut manifest =
        load_manifest(config)?.unwrap_or_else(|| Manifest::new(&config.root));
    let mut dirty = false;

    let mut summary = SnapshotSummary {
        backup_dir: backup_dir.display().to_string(),
        added: 0,
        kept: 0,
    };

    for file in files {
        let key = relative_key(&config.root, file)?;
        if manifest.entry(&key).is_some() {
            summary.kept += 1;
            continue;
        }

        let target = backup_dir.join(&key);
        // A backup without a manifest entry (left by an earlier run of the
        // tool) is still the original; record it instead of replacing it.
        let bytes = if target.is_file() {
            summary.kept += 1;
            io::read_bytes(&target, &format!("read {}", target.display()))?
        } else {
            let bytes = io::read_bytes(file, &format!("read {}", file.display()))?;
            io::copy_file(file, &target)?;
            summary.added += 1;
            bytes
        };

        manifest.entries.push(ManifestEntry {
            path: key,
            size: bytes.len() as u64,
            sha256: io::sha256_hex(&bytes),
        });
        dirty = true;
    }

    if dirty {
        io::create_dir_all(&backup_dir)?;
        save_manifest(config, &manifest)?;
    }

    log_status!(
        "migrate",
        "Backed up {} file(s) to {} ({} already saved)",
        summary.added,
        backup_dir.display(),
        summary.kept
    );
    Ok(summary)
}

// ============================================================================
// Restore
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoredFile {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub command: String,
    pub backup_dir: String,
    #[serde(flatten)]
    pub files: BulkResult<RestoredFile>,
}

/// Copy every manifest entry back over its original path.
///
/// Each backup is checked against its recorded digest first; a mismatch or a
/// missing backup file is reported for that entry and the file is left as is.
pub fn restore(config: &ProjectConfig) -> Result<RestoreReport> {
    let manifest = load_manifest(config)?
        .ok_or_else(|| Error::backup_not_found(manifest_path(config).display().to_string()))?;
    let backup_dir = config.backup_path();

    let mut report = RestoreReport {
        command: "restore".to_string(),
        backup_dir: backup_dir.display().to_string(),
        files: BulkResult {
            action: "restore".to_string(),
            results: Vec::new(),
            summary: BulkSummary::default(),
        },
    };

    for entry in &manifest.entries {
        let outcome = restore_entry(config, &backup_dir, entry);
        report.files.summary.record(outcome.is_ok());
        report.files.results.push(match outcome {
            Ok(restored) => ItemOutcome {
                id: entry.path.clone(),
                result: Some(restored),
                error: None,
            },
            Err(e) => ItemOutcome {
                id: entry.path.clone(),
                result: None,
                error: Some(e.to_string()),
            },
        });
    }

    log_status!(
        "restore",
        "Restored {} of {} file(s)",
        report.files.summary.succeeded,
        report.files.summary.total
    );
    Ok(report)
}

fn restore_entry(
    config: &ProjectConfig,
    backup_dir: &Path,
    entry: &ManifestEntry,
) -> Result<RestoredFile> {
    let backup = backup_dir.join(&entry.path);
    let bytes = io::read_bytes(&backup, &format!("read backup {}", backup.display()))?;

    let actual = io::sha256_hex(&bytes);
    if actual != entry.sha256 {
        return Err(Error::backup_integrity(&entry.path, &entry.sha256, actual));
    }

    let original = config.root.join(&entry.path);
    if let Some(parent) = original.parent() {
        io::create_dir_all(parent)?;
    }
    io::write_file_atomic(&original, &bytes, &format!("restore {}", entry.path))?;

    Ok(RestoredFile {
        path: entry.path.clone(),
        size: bytes.len() as u64,
    })
}

impl StatusReport for RestoreReport {
    fn title(&self) -> &str {
        "restore"
    }

    fn lines(&self) -> Vec<StatusLine> {
        let mut lines: Vec<StatusLine> = self
            .files
            .results
            .iter()
            .map(|item| match &item.error {
                None => StatusLine::ok(format!("restored {}", item.id)),
                Some(err) => StatusLine::fail(format!("{}: {}", item.id, err)),
            })
            .collect();

        let summary = &self.files.summary;
        if summary.all_succeeded() {
            lines.push(StatusLine::ok(format!(
                "{} file(s) restored from {}",
                summary.total, self.backup_dir
            )));
        } else {
            lines.push(StatusLine::fail(format!(
                "{} of {} file(s) could not be restored",
                summary.failed, summary.total
            )));
        }
        lines
    }
}
