use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use sdlmgr::cli::{self, response::exit_code_to_u8};
use sdlmgr::ProjectConfig;

mod commands;

use commands::{build, check, clean, run, test, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "sdlmgr")]
#[command(version = VERSION)]
#[command(about = "Build manager for the Gomoku SDL project (wraps cmake and g++)")]
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

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the compiler, cmake and dependencies are available
    Check,
    /// Configure and build the project
    Build(build::BuildArgs),
    /// Run the built game
    Run,
    /// Remove the build directory
    Clean,
    /// Run the test executables from the build directory
    Test(test::TestArgs),
}

fn print_help() {
    let _ = Cli::command().print_help();
    println!();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
            if let Some(ContextValue::String(name)) = e.get(ContextKind::InvalidSubcommand) {
                println!("Unknown command: {}\n", name);
            }
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => e.exit(),
    };

    let Some(command) = cli.command else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let root = match cli.root {
        Some(root) => root,
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
    let global = GlobalArgs { config };

    let exit_code = match command {
        Commands::Check => cli::finish(check::run(&global), cli.json),
        Commands::Build(args) => cli::finish(build::run(args, &global), cli.json),
        Commands::Run => cli::finish(run::run(&global), cli.json),
        Commands::Clean => cli::finish(clean::run(&global), cli.json),
        Commands::Test(args) => cli::finish(test::run(args, &global), cli.json),
    };

    ExitCode::from(exit_code_to_u8(exit_code))
}
