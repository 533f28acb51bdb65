//! Public output types shared by the build manager and the migrator.
//!
//! Every command returns a serializable result. The CLI either prints the
//! result's status lines or wraps it in a JSON envelope.

use serde::Serialize;

// ============================================================================
// Status lines
// ============================================================================

/// Severity of a single status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Ok,
    Fail,
    Warn,
    Info,
}

impl StatusLevel {
    pub fn glyph(&self) -> &'static str {
        match self {
            StatusLevel::Ok => "✔",
            StatusLevel::Fail => "✘",
            StatusLevel::Warn => "!",
            StatusLevel::Info => " ",
        }
    }
}

/// One human-readable line of a command report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

impl StatusLine {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Ok,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Fail,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warn,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    /// Render as `  ✔ message`.
    pub fn render(&self) -> String {
        format!("  {} {}", self.level.glyph(), self.message)
    }
}

/// Implemented by every command result so the CLI can print it as text.
pub trait StatusReport {
    /// Section header, printed as `[title]`.
    fn title(&self) -> &str;
    fn lines(&self) -> Vec<StatusLine>;
}

// ============================================================================
// Bulk Operations (for commands that process multiple items)
// ============================================================================

/// Standardized bulk execution result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult<T: Serialize> {
    pub action: String,
    pub results: Vec<ItemOutcome<T>>,
    pub summary: BulkSummary,
}

/// Outcome for a single item in a bulk operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome<T: Serialize> {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of bulk operation results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkSummary {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
