use sdlmgr::run::{self, RunOutput};

use super::{CmdResult, GlobalArgs};

pub fn run(global: &GlobalArgs) -> CmdResult<RunOutput> {
    Ok((run::run(&global.config), 0))
}
