//! CLI integration tests for commandeer.
//!
//! Every test runs with the native engine forced off and HOME pointed at a
//! scratch directory, so results do not depend on what is installed.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the commandeer binary command, isolated from the host setup.
fn commandeer(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("commandeer").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("COMMANDEER_FORCE_FALLBACK", "1")
        .env("COMMANDEER_ENGINE", home.path().join("no-such-engine"))
        .env_remove("DEMO_PORT");
    cmd
}

/// Create a temporary directory for test runs.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// ============================================================================
// commandeer --help / --version
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("preview"));
}

#[test]
fn test_version() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// commandeer status
// ============================================================================

#[test]
fn test_status_reports_fallback() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Engine: fallback"))
        .stdout(predicate::str::contains("disabled by configuration"))
        .stderr(predicate::str::contains("note: commands run on the fallback engine"))
        .stderr(predicate::str::contains("Unset COMMANDEER_FORCE_FALLBACK"));
}

#[test]
fn test_status_json() {
    let tmp = temp_dir();

    let output = commandeer(&tmp)
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["engine_available"], false);
    assert_eq!(status["engine_loaded"], false);
    assert!(status["load_error"].as_str().unwrap().contains("disabled"));
}

#[test]
fn test_project_config_disables_engine() {
    let tmp = temp_dir();
    fs::create_dir_all(tmp.path().join(".commandeer")).unwrap();
    fs::write(
        tmp.path().join(".commandeer/config.toml"),
        "[engine]\ndisabled = true\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("commandeer").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env_remove("COMMANDEER_FORCE_FALLBACK")
        .env_remove("COMMANDEER_ENGINE")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Engine: fallback"))
        .stdout(predicate::str::contains("disabled by configuration"));
}

// ============================================================================
// commandeer test
// ============================================================================

#[test]
fn test_self_test_fails_without_engine() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .arg("test")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("[!!] Probe"))
        .stdout(predicate::str::contains("1 of 1 engine checks failed"));
}

#[test]
fn test_self_test_json() {
    let tmp = temp_dir();

    let output = commandeer(&tmp)
        .args(["test", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], false);
    assert_eq!(report["tests"][0]["name"], "Probe");
    assert_eq!(report["tests"][0]["passed"], false);
}

// ============================================================================
// commandeer doctor
// ============================================================================

#[test]
fn test_doctor_prints_guidance() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Engine: fallback"))
        .stdout(predicate::str::contains("Engine Self Test"))
        .stdout(predicate::str::contains("Steps:"));
}

// ============================================================================
// commandeer preview
// ============================================================================

#[test]
fn test_preview_dispatches_subcommand() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--", "serve", "-p", "8080", "main.c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Engine: fallback"))
        .stdout(predicate::str::contains("Invoked: demo serve"))
        .stdout(predicate::str::contains("port = 8080"))
        .stdout(predicate::str::contains("main.c"));
}

#[test]
fn test_preview_alias_and_default() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--fallback", "--", "s", "index.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoked: demo serve"))
        .stdout(predicate::str::contains("port = 3000"));
}

#[test]
fn test_preview_help_target() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--", "help", "remote"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Help for `demo remote`"))
        .stdout(predicate::str::contains("add"));
}

#[test]
fn test_preview_unresolved() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--", "deploy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unresolved: `deploy`"));
}

#[test]
fn test_preview_json() {
    let tmp = temp_dir();

    let output = commandeer(&tmp)
        .args(["preview", "--json", "--", "build", "--release", "lib", "bin"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["engine"], "fallback");
    assert_eq!(doc["dispatch"]["kind"], "invoked");
    assert_eq!(doc["dispatch"]["command"], "demo build");
    assert_eq!(doc["dispatch"]["outcome"]["options"]["release"], true);
    assert_eq!(
        doc["dispatch"]["outcome"]["arguments"],
        serde_json::json!(["lib", "bin"])
    );
}

#[test]
fn test_preview_env_fallback_and_hidden_option() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--", "serve", "main.c"])
        .env("DEMO_PORT", "4000")
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 4000"));

    commandeer(&tmp)
        .args(["preview", "--", "help", "serve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(default: 3000) (env: DEMO_PORT)"))
        .stdout(predicate::str::contains("--trace").not());
}

// ============================================================================
// commandeer preview --parse (help and version exit the process)
// ============================================================================

#[test]
fn test_parse_help_prints_and_exits_zero() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--parse", "--", "help", "serve"])
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::starts_with("Usage: demo serve [options] <file>\n"))
        .stdout(predicate::str::contains("Dispatched").not());
}

#[test]
fn test_parse_root_help_flag_exits_zero() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--parse", "--", "--help"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Commands:\n  serve"))
        .stdout(predicate::str::contains("Dispatched").not());
}

#[test]
fn test_parse_version_exits_zero() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--parse", "--", "--version"])
        .assert()
        .code(0)
        .stdout("1.0.0\n");
}

#[test]
fn test_parse_runs_action_and_returns() {
    let tmp = temp_dir();

    commandeer(&tmp)
        .args(["preview", "--parse", "--", "build", "--release"])
        .assert()
        .success()
        .stdout("Dispatched on the fallback engine\n");
}
