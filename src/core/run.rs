use serde::Serialize;

use crate::config::ProjectConfig;
use crate::output::{StatusLine, StatusReport};
use crate::utils::command;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub command: String,
    pub executable: String,
    pub found: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Launch the built game with inherited stdio and wait for it to exit.
pub fn run(config: &ProjectConfig) -> RunOutput {
    let exe = config.executable_path();
    let mut output = RunOutput {
        command: "run".to_string(),
        executable: exe.display().to_string(),
        found: exe.is_file(),
        success: false,
        exit_code: None,
        error: None,
    };

    if !output.found {
        return output;
    }

    log_status!("run", "Launching {}", output.executable);
    match command::run_passthrough(&output.executable, &[], Some(&config.root)) {
        Ok(code) => {
            output.exit_code = Some(code);
            output.success = code == 0;
        }
        Err(e) => output.error = Some(e.to_string()),
    }

    output
}

impl StatusReport for RunOutput {
    fn title(&self) -> &str {
        "run"
    }

    fn lines(&self) -> Vec<StatusLine> {
        if !self.found {
            return vec![StatusLine::fail(format!(
                "executable not found at {}, build the project first",
                self.executable
            ))];
        }

        let line = match (&self.error, self.exit_code) {
            (Some(err), _) => StatusLine::fail(err.clone()),
            (None, Some(0)) => StatusLine::ok("program exited normally"),
            (None, Some(code)) => StatusLine::fail(format!("program exited abnormally (exit code {})", code)),
            (None, None) => StatusLine::fail("program did not run"),
        };
        vec![line]
    }
}
