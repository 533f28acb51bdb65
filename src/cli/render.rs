//! Plain-text rendering of command reports.

use std::io::{self, Write};

use crate::output::StatusReport;
use crate::Error;

/// `[title]` followed by one glyph line per status entry.
pub fn render_report<R: StatusReport + ?Sized>(report: &R) -> String {
    let mut text = format!("[{}]\n", report.title());
    for line in report.lines() {
        text.push_str(&line.render());
        text.push('\n');
    }
    text
}

pub fn print_report<R: StatusReport + ?Sized>(report: &R) {
    let mut stdout = io::stdout().lock();
    // A closed pipe is not worth failing the command over.
    let _ = stdout.write_all(render_report(report).as_bytes());
}

pub fn print_error(err: &Error) {
    eprintln!("error: {}", err.message);
    for hint in &err.hints {
        eprintln!("  hint: {}", hint.message);
    }
}
