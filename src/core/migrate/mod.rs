//! SDL2 -> SDL3 source migration.
//!
//! Runs in fixed phases: snapshot originals, edit the CMake file, rewrite the
//! source tree, rebuild. Each phase is reported separately; a failed CMake
//! edit or rebuild does not undo earlier writes unless rollback was asked for,
//! and rollback only undoes the writes of the current run.

mod backup;
mod calls;
mod cmake;
mod journal;
mod rules;
mod sources;

pub use backup::{
    load_manifest, manifest_path, restore, Manifest, ManifestEntry, RestoreReport, RestoredFile,
    SnapshotSummary,
};
pub use calls::{split_args, CallRewrite};
pub use cmake::CmakeEdit;
pub use journal::{RollbackOutcome, WriteJournal};
pub use rules::{apply_all, sdl3_rules, ReplacementRule, RuleHit, RuleKind};

use serde::Serialize;
use std::path::PathBuf;

use crate::build::{self, BuildOptions, BuildOutput, OutputMode};
use crate::config::ProjectConfig;
use crate::error::Result;
use crate::output::{StatusLine, StatusReport};
use crate::utils::io;

#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Report what would change without writing anything.
    pub dry_run: bool,
    /// Stop after the source rewrite.
    pub skip_build: bool,
    /// Restore every snapshotted file when a later phase fails.
    pub rollback_on_failure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Snapshot,
    Cmake,
    Sources,
    Rebuild,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Snapshot => "backup",
            Phase::Cmake => "CMake configuration",
            Phase::Sources => "source rewrite",
            Phase::Rebuild => "rebuild",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub detail: String,
}

impl PhaseOutcome {
    fn new(phase: Phase, status: PhaseStatus, detail: impl Into<String>) -> Self {
        Self {
            phase,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: String,
    pub rules: Vec<RuleHit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub command: String,
    pub root: String,
    pub dry_run: bool,
    /// Set when the user declined the confirmation prompt.
    pub cancelled: bool,
    pub success: bool,
    pub phases: Vec<PhaseOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<SnapshotSummary>,
    pub files_scanned: usize,
    pub changed: Vec<FileChange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildOutput>,
    /// Set when a failed run was rolled back to its starting state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolled_back: Option<RollbackOutcome>,
}

impl MigrationReport {
    fn new(config: &ProjectConfig, dry_run: bool) -> Self {
        Self {
            command: "migrate".to_string(),
            root: config.root.display().to_string(),
            dry_run,
            cancelled: false,
            success: false,
            phases: Vec::new(),
            backup: None,
            files_scanned: 0,
            changed: Vec::new(),
            skipped: Vec::new(),
            build: None,
            rolled_back: None,
        }
    }

    /// Report for a run the user declined. Nothing was touched.
    pub fn cancelled(config: &ProjectConfig) -> Self {
        Self {
            cancelled: true,
            ..Self::new(config, false)
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// True when the rebuild phase ran and failed.
    pub fn build_failed(&self) -> bool {
        self.phase(Phase::Rebuild)
            .is_some_and(|p| p.status == PhaseStatus::Failed)
    }

    fn record(&mut self, outcome: PhaseOutcome) {
        self.phases.push(outcome);
    }
}

/// Source files the migration would touch, in walk order.
///
/// The backup and build directories, the configured exclusions and every
/// dependency directory are left out.
pub fn source_files(config: &ProjectConfig) -> Vec<PathBuf> {
    let mut excluded = vec![config.backup_path(), config.build_path()];
    excluded.extend(
        config
            .migration
            .exclude_dirs
            .iter()
            .map(|dir| config.root.join(dir)),
    );
    excluded.extend(
        config
            .dependencies
            .iter()
            .map(|dep| config.dependency_path(dep))
            .filter(|path| path.is_dir()),
    );
    sources::collect(&config.root, &config.migration.extensions, &excluded)
}

/// Run the migration against `config.root`.
///
/// Confirmation is the caller's job; this function writes as soon as it is
/// called (unless `dry_run`).
pub fn migrate(config: &ProjectConfig, options: &MigrateOptions) -> Result<MigrationReport> {
    let rules = sdl3_rules(&config.migration)?;
    let files = source_files(config);
    let mut report = MigrationReport::new(config, options.dry_run);
    report.files_scanned = files.len();

    if options.dry_run {
        report.record(PhaseOutcome::new(Phase::Snapshot, PhaseStatus::Skipped, "dry run"));
        let cmake = cmake_phase(config, None)?;
        report.record(cmake);
        rewrite_sources(config, &rules, &files, None, &mut report)?;
        report.record(PhaseOutcome::new(Phase::Rebuild, PhaseStatus::Skipped, "dry run"));
        report.success = !report.phases.iter().any(|p| p.status == PhaseStatus::Failed);
        return Ok(report);
    }

    let mut targets = files.clone();
    let cmake_path = config.cmake_file_path();
    if cmake_path.is_file() {
        targets.push(cmake_path);
    }
    let summary = backup::snapshot(config, &targets)?;
    report.record(PhaseOutcome::new(
        Phase::Snapshot,
        PhaseStatus::Ok,
        format!(
            "{} file(s) saved to {} ({} already backed up)",
            summary.added, summary.backup_dir, summary.kept
        ),
    ));
    report.backup = Some(summary);

    let mut journal = WriteJournal::default();
    if let Err(e) = write_phases(config, &rules, &files, options, &mut journal, &mut report) {
        if journal.is_empty() {
            return Err(e);
        }
        if options.rollback_on_failure {
            log_status!("migrate", "Rolling back after error: {}", e);
            let outcome = journal.rollback();
            return Err(e.with_hint(outcome.summary()));
        }
        return Err(e.with_hint(format!(
            "{} file(s) were already rewritten; `sdl3-migrate restore` puts back the originals from {}",
            journal.len(),
            config.backup_path().display()
        )));
    }

    report.success = !report.phases.iter().any(|p| p.status == PhaseStatus::Failed);

    if !report.success && options.rollback_on_failure {
        report.rolled_back = Some(journal.rollback());
    }

    Ok(report)
}

fn write_phases(
    config: &ProjectConfig,
    rules: &[ReplacementRule],
    files: &[PathBuf],
    options: &MigrateOptions,
    journal: &mut WriteJournal,
    report: &mut MigrationReport,
) -> Result<()> {
    let cmake = cmake_phase(config, Some(&mut *journal))?;
    report.record(cmake);

    rewrite_sources(config, rules, files, Some(journal), report)?;

    if options.skip_build {
        report.record(PhaseOutcome::new(
            Phase::Rebuild,
            PhaseStatus::Skipped,
            "skipped (--skip-build)",
        ));
        return Ok(());
    }

    let output = rebuild(config)?;
    let outcome = match output.failed_step() {
        Some(step) => PhaseOutcome::new(
            Phase::Rebuild,
            PhaseStatus::Failed,
            build::format_step_failure(step),
        ),
        None if output.success => PhaseOutcome::new(Phase::Rebuild, PhaseStatus::Ok, "build succeeded"),
        None => PhaseOutcome::new(Phase::Rebuild, PhaseStatus::Failed, "build did not complete"),
    };
    report.record(outcome);
    report.build = Some(output);
    Ok(())
}

/// Edit the CMake file. `journal` is `None` for a dry run.
fn cmake_phase(config: &ProjectConfig, journal: Option<&mut WriteJournal>) -> Result<PhaseOutcome> {
    let path = config.cmake_file_path();
    let dry_run = journal.is_none();
    let original = match &journal {
        Some(_) if path.is_file() => Some(io::read_bytes(&path, &format!("read {}", path.display()))?),
        _ => None,
    };

    let edit = cmake::edit_file(&path, dry_run)?;
    if let (CmakeEdit::Updated, Some(journal), Some(original)) = (&edit, journal, original) {
        journal.record(&path, original);
    }

    let outcome = match edit {
        CmakeEdit::Missing => PhaseOutcome::new(
            Phase::Cmake,
            PhaseStatus::Failed,
            format!("{} not found", path.display()),
        ),
        CmakeEdit::Unchanged => {
            PhaseOutcome::new(Phase::Cmake, PhaseStatus::Ok, "already references SDL3")
        }
        CmakeEdit::Updated if dry_run => PhaseOutcome::new(
            Phase::Cmake,
            PhaseStatus::Ok,
            format!("{} would be updated", config.migration.cmake_file),
        ),
        CmakeEdit::Updated => PhaseOutcome::new(
            Phase::Cmake,
            PhaseStatus::Ok,
            format!("{} updated", config.migration.cmake_file),
        ),
    };
    Ok(outcome)
}

fn rewrite_sources(
    config: &ProjectConfig,
    rules: &[ReplacementRule],
    files: &[PathBuf],
    mut journal: Option<&mut WriteJournal>,
    report: &mut MigrationReport,
) -> Result<()> {
    let dry_run = journal.is_none();
    for file in files {
        let key = backup::relative_key(&config.root, file)?;
        let bytes = io::read_bytes(file, &format!("read {}", file.display()))?;
        let Ok(text) = String::from_utf8(bytes) else {
            log_status!("migrate", "Skipping {} (not valid UTF-8)", key);
            report.skipped.push(SkippedFile {
                path: key,
                reason: "not valid UTF-8".to_string(),
            });
            continue;
        };

        let (updated, hits) = apply_all(rules, &text);
        if updated == text {
            continue;
        }

        if let Some(journal) = journal.as_deref_mut() {
            io::write_file_atomic(file, updated.as_bytes(), &format!("write {}", key))?;
            journal.record(file, text.into_bytes());
            log_status!("migrate", "Updated {}", key);
        }
        report.changed.push(FileChange { path: key, rules: hits });
    }

    let verb = if dry_run { "would change" } else { "changed" };
    report.record(PhaseOutcome::new(
        Phase::Sources,
        PhaseStatus::Ok,
        format!("{} of {} file(s) {}", report.changed.len(), files.len(), verb),
    ));
    Ok(())
}

/// Fresh build directory, then configure and compile with captured output.
fn rebuild(config: &ProjectConfig) -> Result<BuildOutput> {
    let build_dir = config.build_path();
    if build_dir.exists() {
        io::remove_dir_all(&build_dir)?;
    }
    io::create_dir_all(&build_dir)?;
    build::configure_and_build(config, &BuildOptions::default(), OutputMode::Captured)
}

impl StatusReport for MigrationReport {
    fn title(&self) -> &str {
        if self.dry_run {
            "sdl3 migration (dry run)"
        } else {
            "sdl3 migration"
        }
    }

    fn lines(&self) -> Vec<StatusLine> {
        if self.cancelled {
            return vec![StatusLine::info("cancelled, no files were modified")];
        }

        let mut lines = Vec::new();
        let verb = if self.dry_run { "would update" } else { "updated" };

        for phase in &self.phases {
            let text = format!("{}: {}", phase.phase.label(), phase.detail);
            lines.push(match phase.status {
                PhaseStatus::Ok => StatusLine::ok(text),
                PhaseStatus::Failed => StatusLine::fail(text),
                PhaseStatus::Skipped => StatusLine::info(text),
            });

            if phase.phase == Phase::Sources {
                for change in &self.changed {
                    let rules: Vec<String> = change
                        .rules
                        .iter()
                        .map(|hit| format!("{} x{}", hit.rule, hit.count))
                        .collect();
                    lines.push(StatusLine::info(format!(
                        "{} {} ({})",
                        verb,
                        change.path,
                        rules.join(", ")
                    )));
                }
                for skipped in &self.skipped {
                    lines.push(StatusLine::warn(format!(
                        "skipped {}: {}",
                        skipped.path, skipped.reason
                    )));
                }
            }
        }

        if let Some(outcome) = &self.rolled_back {
            if outcome.failed.is_empty() {
                lines.push(StatusLine::warn(outcome.summary()));
            } else {
                lines.push(StatusLine::fail(outcome.summary()));
            }
        }

        if self.success {
            lines.push(StatusLine::ok(if self.dry_run {
                "dry run complete, nothing was written"
            } else {
                "migration complete"
            }));
        } else if let Some(backup) = &self.backup {
            lines.push(StatusLine::fail(format!(
                "migration finished with errors, originals are in {}",
                backup.backup_dir
            )));
        } else {
            lines.push(StatusLine::fail("migration finished with errors"));
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const MAIN_CPP: &str = "#include <SDL2/SDL.h>\n\
        int main() {\n\
        \x20   SDL_Init(SDL_INIT_VIDEO);\n\
        \x20   SDL_Renderer* r = SDL_CreateRenderer(win, -1, flags);\n\
        }\n";

    const CMAKE: &str = "find_package(SDL2 REQUIRED)\n\
        target_link_libraries(gomoku ${SDL2_LIBRARIES})\n";

    fn project() -> (TempDir, ProjectConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/main.cpp"), MAIN_CPP).unwrap();
        std::fs::write(root.join("src/board.h"), "#pragma once\n").unwrap();
        std::fs::write(root.join("CMakeLists.txt"), CMAKE).unwrap();
        let config = ProjectConfig::with_root(root);
        (dir, config)
    }

    fn no_build() -> MigrateOptions {
        MigrateOptions {
            skip_build: true,
            ..MigrateOptions::default()
        }
    }

    fn read(root: &Path, rel: &str) -> String {
        std::fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn rewrites_sources_and_keeps_byte_identical_backup() {
        let (dir, config) = project();
        let root = dir.path();

        let report = migrate(&config, &no_build()).unwrap();

        assert!(report.success);
        let main = read(root, "src/main.cpp");
        assert!(main.starts_with("#include <SDL3/SDL.h>\n"));
        assert!(main.contains("SDL_InitVideo();"));
        assert!(main.contains("SDL_CreateRenderer(win, flags)"));
        assert_eq!(read(root, "sdl2_backup/src/main.cpp"), MAIN_CPP);
        assert_eq!(read(root, "sdl2_backup/CMakeLists.txt"), CMAKE);
        assert!(read(root, "CMakeLists.txt").contains("${SDL3_LIBRARY}"));

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.changed.len(), 1);
        assert_eq!(report.changed[0].path, "src/main.cpp");
    }

    #[test]
    fn second_run_writes_nothing() {
        let (dir, config) = project();
        let main = dir.path().join("src/main.cpp");
        migrate(&config, &no_build()).unwrap();
        let modified = std::fs::metadata(&main).unwrap().modified().unwrap();
        let content = read(dir.path(), "src/main.cpp");

        let report = migrate(&config, &no_build()).unwrap();

        assert!(report.changed.is_empty());
        assert_eq!(read(dir.path(), "src/main.cpp"), content);
        assert_eq!(std::fs::metadata(&main).unwrap().modified().unwrap(), modified);
        assert_eq!(read(dir.path(), "sdl2_backup/src/main.cpp"), MAIN_CPP);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (dir, config) = project();
        let options = MigrateOptions {
            dry_run: true,
            ..MigrateOptions::default()
        };

        let report = migrate(&config, &options).unwrap();

        assert_eq!(report.changed.len(), 1);
        assert_eq!(read(dir.path(), "src/main.cpp"), MAIN_CPP);
        assert_eq!(read(dir.path(), "CMakeLists.txt"), CMAKE);
        assert!(!dir.path().join("sdl2_backup").exists());
        assert!(report.build.is_none());
    }

    #[test]
    fn missing_cmake_file_fails_phase_but_sources_still_migrate() {
        let (dir, config) = project();
        std::fs::remove_file(dir.path().join("CMakeLists.txt")).unwrap();

        let report = migrate(&config, &no_build()).unwrap();

        assert!(!report.success);
        assert_eq!(report.phase(Phase::Cmake).unwrap().status, PhaseStatus::Failed);
        assert!(read(dir.path(), "src/main.cpp").contains("SDL3"));
    }

    #[test]
    fn non_utf8_sources_are_skipped() {
        let (dir, config) = project();
        let binary = dir.path().join("src/blob.c");
        std::fs::write(&binary, [0xff, 0xfe, b'S', b'D', b'L']).unwrap();

        let report = migrate(&config, &no_build()).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "src/blob.c");
        assert_eq!(std::fs::read(&binary).unwrap(), vec![0xff, 0xfe, b'S', b'D', b'L']);
    }

    #[test]
    fn failed_rebuild_keeps_migrated_files() {
        let (dir, mut config) = project();
        config.tools.cmake = "nonexistent_cmake_xyz".to_string();

        let report = migrate(&config, &MigrateOptions::default()).unwrap();

        assert!(!report.success);
        assert!(report.build_failed());
        assert!(read(dir.path(), "src/main.cpp").contains("SDL_InitVideo()"));
        assert!(dir.path().join("build").is_dir());
    }

    #[test]
    fn rollback_restores_originals_after_failed_rebuild() {
        let (dir, mut config) = project();
        config.tools.cmake = "nonexistent_cmake_xyz".to_string();
        let options = MigrateOptions {
            rollback_on_failure: true,
            ..MigrateOptions::default()
        };

        let report = migrate(&config, &options).unwrap();

        let rolled_back = report.rolled_back.unwrap();
        assert_eq!(rolled_back.restored, 2);
        assert!(rolled_back.failed.is_empty());
        assert_eq!(read(dir.path(), "src/main.cpp"), MAIN_CPP);
        assert_eq!(read(dir.path(), "CMakeLists.txt"), CMAKE);
        assert_eq!(read(dir.path(), "src/board.h"), "#pragma once\n");
    }

    #[test]
    fn rollback_keeps_work_done_after_the_first_migration() {
        let (dir, mut config) = project();
        migrate(&config, &no_build()).unwrap();

        let mut edited = read(dir.path(), "src/main.cpp");
        edited.push_str("/* new work */\nbool quit(SDL_Event e) { return e.type == SDL_QUIT; }\n");
        std::fs::write(dir.path().join("src/main.cpp"), &edited).unwrap();
        let cmake_after_first_run = read(dir.path(), "CMakeLists.txt");

        config.tools.cmake = "nonexistent_cmake_xyz".to_string();
        let options = MigrateOptions {
            rollback_on_failure: true,
            ..MigrateOptions::default()
        };
        let report = migrate(&config, &options).unwrap();

        assert!(!report.success);
        assert_eq!(report.rolled_back.unwrap().restored, 1);
        assert_eq!(read(dir.path(), "src/main.cpp"), edited);
        assert_eq!(read(dir.path(), "CMakeLists.txt"), cmake_after_first_run);
        assert!(read(dir.path(), "CMakeLists.txt").contains("SDL3"));
        assert_eq!(read(dir.path(), "sdl2_backup/src/main.cpp"), MAIN_CPP);
    }

    #[test]
    fn write_error_rolls_back_and_reports_outcome() {
        let (dir, config) = project();
        let root = dir.path();
        std::fs::write(root.join("src/z.cpp"), "#include <SDL2/SDL.h>\n").unwrap();
        // The atomic write needs this name for its temp file.
        std::fs::create_dir_all(root.join("src/z.cpp.tmp")).unwrap();
        let options = MigrateOptions {
            skip_build: true,
            rollback_on_failure: true,
            ..MigrateOptions::default()
        };

        let err = migrate(&config, &options).unwrap_err();

        assert!(err
            .hints
            .iter()
            .any(|hint| hint.message.contains("rolled back 2 file(s)")));
        assert_eq!(read(root, "src/main.cpp"), MAIN_CPP);
        assert_eq!(read(root, "CMakeLists.txt"), CMAKE);
        assert_eq!(read(root, "src/z.cpp"), "#include <SDL2/SDL.h>\n");
    }

    #[test]
    fn write_error_without_rollback_points_at_restore() {
        let (dir, config) = project();
        let root = dir.path();
        std::fs::write(root.join("src/z.cpp"), "#include <SDL2/SDL.h>\n").unwrap();
        std::fs::create_dir_all(root.join("src/z.cpp.tmp")).unwrap();

        let err = migrate(&config, &no_build()).unwrap_err();

        assert!(err.hints.iter().any(|hint| hint.message.contains("sdl3-migrate restore")));
        assert!(read(root, "src/main.cpp").contains("SDL3"));
    }

    #[test]
    fn dependency_directories_are_not_migrated() {
        let (dir, config) = project();
        let root = dir.path();
        let header = root.join("deps/SDL3/include/SDL3/SDL.h");
        std::fs::create_dir_all(header.parent().unwrap()).unwrap();
        std::fs::write(&header, "#include <SDL2/SDL.h>\n").unwrap();

        let report = migrate(&config, &no_build()).unwrap();

        assert_eq!(report.files_scanned, 2);
        assert_eq!(std::fs::read_to_string(&header).unwrap(), "#include <SDL2/SDL.h>\n");
        assert!(!root.join("sdl2_backup/deps").exists());
    }

    #[test]
    fn configured_exclusions_are_not_migrated() {
        let (dir, mut config) = project();
        let root = dir.path();
        std::fs::create_dir_all(root.join("third_party/imgui")).unwrap();
        std::fs::write(root.join("third_party/imgui/backend.cpp"), "#include <SDL2/SDL.h>\n").unwrap();
        config.migration.exclude_dirs = vec!["third_party".to_string()];

        let files = source_files(&config);

        assert!(files.iter().all(|f| !f.starts_with(root.join("third_party"))));
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn cancelled_report_renders_single_line() {
        let (_dir, config) = project();
        let report = MigrationReport::cancelled(&config);
        let lines = report.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].message.contains("cancelled"));
    }
}
