use clap::Args;
use sdlmgr::build::{self, BuildOptions, BuildOutput, BuildProfile};

use super::{CmdResult, GlobalArgs};

#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Parallel build jobs
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Configure with CMAKE_BUILD_TYPE=Release
    #[arg(long, conflicts_with = "debug")]
    pub release: bool,

    /// Configure with CMAKE_BUILD_TYPE=Debug
    #[arg(long)]
    pub debug: bool,
}

impl BuildArgs {
    fn options(&self) -> BuildOptions {
        let profile = if self.release {
            Some(BuildProfile::Release)
        } else if self.debug {
            Some(BuildProfile::Debug)
        } else {
            None
        };
        BuildOptions {
            jobs: self.jobs,
            profile,
        }
    }
}

pub fn run(args: BuildArgs, global: &GlobalArgs) -> CmdResult<BuildOutput> {
    build::run(&global.config, &args.options())
}
