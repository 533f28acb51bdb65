use sdlmgr::clean::{self, CleanOutput};

use super::{CmdResult, GlobalArgs};

pub fn run(global: &GlobalArgs) -> CmdResult<CleanOutput> {
    Ok((clean::clean(&global.config)?, 0))
}
