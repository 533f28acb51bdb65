use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const MAIN_CPP: &str = "#include <SDL2/SDL.h>\n\
    int main() {\n\
    \x20   SDL_Renderer* r = SDL_CreateRenderer(win, -1, flags);\n\
    }\n";

fn sdlmgr(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sdlmgr"))
        .arg("--root")
        .arg(root)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .unwrap()
}

fn migrator(root: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sdl3-migrate"))
        .arg("--root")
        .arg(root)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn game_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/main.cpp"), MAIN_CPP).unwrap();
    std::fs::write(
        dir.path().join("CMakeLists.txt"),
        "find_package(SDL2 REQUIRED)\n",
    )
    .unwrap();
    dir
}

#[test]
fn no_arguments_prints_help() {
    let dir = TempDir::new().unwrap();
    let output = sdlmgr(dir.path(), &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage"));
}

#[test]
fn unknown_command_prints_help_and_succeeds() {
    let dir = TempDir::new().unwrap();
    let output = sdlmgr(dir.path(), &["deploy"]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Unknown command: deploy"));
    assert!(text.contains("Usage"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn clean_twice_reports_missing_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("build/CMakeFiles")).unwrap();

    let first = sdlmgr(dir.path(), &["clean"]);
    assert!(first.status.success());
    assert!(stdout(&first).contains("removed"));
    assert!(!dir.path().join("build").exists());

    let second = sdlmgr(dir.path(), &["clean"]);
    assert!(second.status.success());
    assert!(stdout(&second).contains("does not exist"));
}

#[test]
fn clean_json_envelope() {
    let dir = TempDir::new().unwrap();
    let output = sdlmgr(dir.path(), &["--json", "clean"]);

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["removed"], false);
}

#[test]
fn build_with_missing_compiler_attempts_nothing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("sdlmgr.json"),
        r#"{"tools": {"compiler": "nonexistent_compiler_xyz"}}"#,
    )
    .unwrap();

    let output = sdlmgr(dir.path(), &["build"]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("nonexistent_compiler_xyz not available"));
    assert!(text.contains("build skipped"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn invalid_config_exits_with_code_2() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("sdlmgr.json"), "{ broken").unwrap();

    let output = sdlmgr(dir.path(), &["check"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn zero_jobs_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = sdlmgr(dir.path(), &["build", "-j", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn declined_prompt_touches_nothing() {
    let dir = game_project();

    let output = migrator(dir.path(), &[], "n\n");

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("cancelled"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/main.cpp")).unwrap(),
        MAIN_CPP
    );
    assert!(!dir.path().join("sdl2_backup").exists());
}

#[test]
fn confirmed_migration_rewrites_and_backs_up() {
    let dir = game_project();

    let output = migrator(dir.path(), &["--skip-build"], "y\n");

    assert_eq!(output.status.code(), Some(0));
    let main = std::fs::read_to_string(dir.path().join("src/main.cpp")).unwrap();
    assert!(main.contains("#include <SDL3/SDL.h>"));
    assert!(main.contains("SDL_CreateRenderer(win, flags)"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("sdl2_backup/src/main.cpp")).unwrap(),
        MAIN_CPP
    );
    assert!(dir.path().join("sdl2_backup/manifest.json").is_file());
}

#[test]
fn restore_puts_originals_back() {
    let dir = game_project();
    migrator(dir.path(), &["--yes", "--skip-build"], "");

    let output = migrator(dir.path(), &["restore"], "");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/main.cpp")).unwrap(),
        MAIN_CPP
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("CMakeLists.txt")).unwrap(),
        "find_package(SDL2 REQUIRED)\n"
    );
}

#[test]
fn restore_without_backup_exits_with_code_4() {
    let dir = TempDir::new().unwrap();
    let output = migrator(dir.path(), &["--json", "restore"], "");

    assert_eq!(output.status.code(), Some(4));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["error"]["code"], "backup.not_found");
}

#[cfg(unix)]
#[test]
fn test_with_relative_root_runs_from_build_dir() {
    let parent = TempDir::new().unwrap();
    let build = parent.path().join("proj/build");
    std::fs::create_dir_all(&build).unwrap();
    write_script(&build.join("test_a"), "exit 0\n");

    let output = Command::new(env!("CARGO_BIN_EXE_sdlmgr"))
        .current_dir(parent.path())
        .args(["--root", "proj", "test"])
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("test_a"));
    assert!(text.contains("passed"));
}

#[cfg(unix)]
#[test]
fn failed_compile_step_exits_with_code_1() {
    let dir = TempDir::new().unwrap();
    let tool = dir.path().join("fake-cmake");
    write_script(
        &tool,
        "if [ \"$1\" = \"--build\" ]; then echo boom >&2; exit 2; fi\nexit 0\n",
    );
    let config = serde_json::json!({
        "tools": {"cmake": tool, "compiler": tool},
        "dependencies": []
    });
    std::fs::write(dir.path().join("sdlmgr.json"), config.to_string()).unwrap();

    let output = sdlmgr(dir.path(), &["--json", "build"]);

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["data"]["success"], false);
    let steps = value["data"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
}
