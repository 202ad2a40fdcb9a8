//! Smoke tests for the depviz CLI.
//!
//! These tests verify basic CLI functionality:
//! - `depviz --version` outputs version info
//! - `depviz --help` outputs help text
//! - unknown commands fail

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the depviz binary.
fn depviz() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_depviz"));
    cmd.env_remove("DEPVIZ_LOG");
    cmd
}

#[test]
fn test_version_flag() {
    depviz()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("depviz"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    depviz()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("graph"))
        .stdout(predicate::str::contains("layouts"));
}

#[test]
fn test_no_args_prints_help() {
    depviz()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_graph_help() {
    depviz()
        .args(["graph", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--layout"))
        .stdout(predicate::str::contains("--without-external-deps"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_invalid_command() {
    depviz()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_format_value() {
    depviz()
        .args(["graph", "--format", "png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
