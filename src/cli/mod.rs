//! Shared CLI plumbing for the `sdlmgr` and `sdl3-migrate` binaries.

pub mod render;
pub mod response;

use serde::Serialize;

use crate::output::StatusReport;
use crate::{Error, Result};

/// Print a command result as status lines or as the JSON envelope and return
/// the process exit code.
pub fn finish<T: Serialize + StatusReport>(result: Result<(T, i32)>, json: bool) -> i32 {
    if json {
        let (json_result, exit_code) = response::map_cmd_result_to_json(result);
        if let Err(e) = response::print_json_result(json_result) {
            render::print_error(&e);
            return 1;
        }
        return exit_code;
    }

    match result {
        Ok((report, exit_code)) => {
            render::print_report(&report);
            exit_code
        }
        Err(err) => fail(&err, false),
    }
}

/// Report an error that happened before any command ran.
pub fn fail(err: &Error, json: bool) -> i32 {
    let exit_code = response::exit_code_for_error(err.code);
    if json {
        let _ = response::print_json_result(Err(err.clone()));
    } else {
        render::print_error(err);
    }
    exit_code
}
