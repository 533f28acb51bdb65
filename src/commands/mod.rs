use sdlmgr::ProjectConfig;

pub type CmdResult<T> = sdlmgr::Result<(T, i32)>;

/// Settings shared by every subcommand, resolved once at startup.
pub(crate) struct GlobalArgs {
    pub config: ProjectConfig,
}

pub mod build;
pub mod check;
pub mod clean;
pub mod run;
