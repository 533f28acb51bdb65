//! Confirmation prompt for destructive operations.

use std::io::{self, BufRead, Write};

use crate::error::{Error, Result};

/// Question asked before the migrator touches any file.
pub const MODIFY_FILES_QUESTION: &str = "This will modify project files. Continue? (y/N): ";

/// Ask `question` on stderr and read one line from stdin.
///
/// Stdin is read even when it is not a terminal, so `echo y | sdl3-migrate`
/// works. End of input counts as "no".
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    confirm_with(&mut stdin.lock(), &mut stderr, question)
}

/// Only a trimmed answer of exactly `y` or `Y` confirms.
pub fn confirm_with<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, question: &str) -> Result<bool> {
    write!(writer, "{}", question)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::internal_io(e.to_string(), Some("write prompt".to_string())))?;

    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| Error::internal_io(e.to_string(), Some("read confirmation".to_string())))?;

    Ok(matches!(line.trim(), "y" | "Y"))
}
