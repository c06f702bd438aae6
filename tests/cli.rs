//! End-to-end CLI tests (SPEC_FULL.md A.4): drive the compiled `cobbler`
//! binary the way an operator would, via `assert_cmd`, instead of calling
//! into the library directly.

use std::process::Command;

use assert_cmd::cargo::cargo_bin;
use predicates::prelude::*;
use tempfile::TempDir;

fn cobbler_cmd_in(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("cobbler"));
    cmd.current_dir(dir);
    cmd.env_remove("COBBLER_ISSUE_TOKEN");
    cmd.env_remove("GITHUB_TOKEN");
    cmd
}

fn init_git_repo(dir: &std::path::Path) {
    let run = |args: &[&str]| {
        assert!(Command::new("git").args(args).current_dir(dir).status().unwrap().success());
    };
    run(&["init", "-q"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "test"]);
    std::fs::write(dir.join("README.md"), "hello\n").unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "initial"]);
}

#[test]
fn help_lists_the_core_subcommands() {
    let td = TempDir::new().unwrap();
    cobbler_cmd_in(td.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generator"))
        .stdout(predicate::str::contains("doctor"))
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn init_writes_a_default_config_file_and_is_idempotent() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());

    cobbler_cmd_in(td.path()).arg("init").assert().success();
    assert!(td.path().join(".cobbler").join("config.yaml").exists());

    // Running it again must not fail or overwrite the file.
    cobbler_cmd_in(td.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn stats_reports_source_attribution_for_defaulted_fields() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());

    cobbler_cmd_in(td.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("cobbler.dir"))
        .stdout(predicate::str::contains("Defaults"));
}

#[test]
fn credentials_reports_the_missing_issue_token() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());

    cobbler_cmd_in(td.path())
        .arg("credentials")
        .assert()
        .success()
        .stdout(predicate::str::contains("not set (COBBLER_ISSUE_TOKEN"));
}

#[test]
fn doctor_fails_when_the_configured_llm_binary_is_missing() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());
    std::fs::create_dir_all(td.path().join(".cobbler")).unwrap();
    std::fs::write(
        td.path().join(".cobbler").join("config.yaml"),
        "claude:\n  binary: definitely-not-a-real-binary-xyz\n",
    )
    .unwrap();

    cobbler_cmd_in(td.path())
        .arg("doctor")
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"));
}

#[test]
fn passthrough_commands_no_op_successfully() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());

    for cmd in ["build", "lint", "install", "clean"] {
        cobbler_cmd_in(td.path())
            .arg(cmd)
            .assert()
            .success()
            .stdout(predicate::str::contains("nothing to do"));
    }
}

#[test]
fn generator_run_without_a_credential_fails_as_an_environment_error() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());

    cobbler_cmd_in(td.path())
        .args(["generator", "start"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn scratch_reset_succeeds_even_with_nothing_to_clean() {
    let td = TempDir::new().unwrap();
    init_git_repo(td.path());

    cobbler_cmd_in(td.path()).arg("scratch-reset").assert().success();
}
