//! Pre-write contents of every file changed during one migration run.
//!
//! Rollback replays this journal, so it returns files to their state at the
//! start of the run. The backup directory keeps the pre-migration originals
//! for an explicit restore.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::utils::io;

#[derive(Debug, Clone)]
struct JournalEntry {
    path: PathBuf,
    original: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct WriteJournal {
    entries: Vec<JournalEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackOutcome {
    pub restored: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

impl RollbackOutcome {
    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("rolled back {} file(s) to their state before this run", self.restored)
        } else {
            format!(
                "rolled back {} file(s); could not roll back: {}",
                self.restored,
                self.failed.join("; ")
            )
        }
    }
}

impl WriteJournal {
    /// Remember `original` as the content of `path` before its first write
    /// in this run.
    pub fn record(&mut self, path: &Path, original: Vec<u8>) {
        if self.entries.iter().any(|e| e.path == path) {
            return;
        }
        self.entries.push(JournalEntry {
            path: path.to_path_buf(),
            original,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every recorded original back, newest first.
    pub fn rollback(&self) -> RollbackOutcome {
        let mut outcome = RollbackOutcome::default();
        for entry in self.entries.iter().rev() {
            let op = format!("roll back {}", entry.path.display());
            match io::write_file_atomic(&entry.path, &entry.original, &op) {
                Ok(()) => outcome.restored += 1,
                Err(e) => outcome.failed.push(e.to_string()),
            }
        }
        log_status!("migrate", "{}", outcome.summary());
        outcome
    }
}
