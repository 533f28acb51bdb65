use sdlmgr::check::{self, CheckReport};

use super::{CmdResult, GlobalArgs};

/// A failed check is reported, not fatal.
pub fn run(global: &GlobalArgs) -> CmdResult<CheckReport> {
    Ok((check::check(&global.config), 0))
}
