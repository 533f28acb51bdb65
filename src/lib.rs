/// Macro for prefixed status logging to stderr (only when stderr is a terminal).
///
/// Usage:
/// ```ignore
/// log_status!("build", "Configuring with generator {}", generator);
/// log_status!("migrate", "Backed up {} files", count);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr()) {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

pub mod cli;
pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `sdlmgr::config` instead of `sdlmgr::core::config`
pub use self::core::*;
pub use self::utils::*;
