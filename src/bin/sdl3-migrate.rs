use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use sdlmgr::cli::{self, response::exit_code_to_u8};
use sdlmgr::migrate::{self, MigrateOptions, MigrationReport, RestoreReport};
use sdlmgr::prompt::{self, MODIFY_FILES_QUESTION};
use sdlmgr::{ProjectConfig, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "sdl3-migrate")]
#[command(version = VERSION)]
#[command(about = "Rewrite SDL2 API usage to SDL3, back up originals and rebuild")]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Configuration file (defaults to <root>/sdlmgr.json when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the JSON response envelope instead of status lines
    #[arg(long, global = true)]
    json: bool,

    /// Report what would change without writing, backing up or building
    #[arg(long)]
    dry_run: bool,

    /// Stop after rewriting sources
    #[arg(long)]
    skip_build: bool,

    /// Restore the backed-up originals if any phase fails
    #[arg(long)]
    rollback_on_failure: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    #[command(subcommand)]
    command: Option<MigrateCommand>,
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Copy the backed-up originals back over the project files
    Restore,
}

fn run_migration(config: &ProjectConfig, cli: &Cli) -> Result<(MigrationReport, i32)> {
    if !cli.dry_run && !cli.yes && !prompt::confirm(MODIFY_FILES_QUESTION)? {
        return Ok((MigrationReport::cancelled(config), 0));
    }

    let options = MigrateOptions {
        dry_run: cli.dry_run,
        skip_build: cli.skip_build,
        rollback_on_failure: cli.rollback_on_failure,
    };
    let report = migrate::migrate(config, &options)?;
    let exit_code = if report.build_failed() { 1 } else { 0 };
    Ok((report, exit_code))
}

fn run_restore(config: &ProjectConfig) -> Result<(RestoreReport, i32)> {
    let report = migrate::restore(config)?;
    let exit_code = if report.files.summary.all_succeeded() { 0 } else { 1 };
    Ok((report, exit_code))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                let err = sdlmgr::Error::internal_io(
                    e.to_string(),
                    Some("resolve current directory".to_string()),
                );
                return ExitCode::from(exit_code_to_u8(cli::fail(&err, cli.json)));
            }
        },
    };

    let config = match ProjectConfig::load(&root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return ExitCode::from(exit_code_to_u8(cli::fail(&err, cli.json))),
    };

    let exit_code = match cli.command {
        Some(MigrateCommand::Restore) => cli::finish(run_restore(&config), cli.json),
        None => cli::finish(run_migration(&config, &cli), cli.json),
    };

    ExitCode::from(exit_code_to_u8(exit_code))
}
