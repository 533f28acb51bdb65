// Public modules
pub mod build;
pub mod check;
pub mod clean;
pub mod config;
pub mod error;
pub mod migrate;
pub mod output;
pub mod prompt;
pub mod run;
pub mod test_runner;

// Re-export common types for convenience
pub use config::ProjectConfig;
pub use error::{Error, ErrorCode, Result};
pub use output::{BulkResult, BulkSummary, ItemOutcome, StatusLevel, StatusLine};
