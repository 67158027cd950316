// Integration tests for the openness CLI surface.
//
// These tests use assert_cmd to invoke the binary and verify
// argument handling, exit codes and stderr output.

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to build a Command for the openness binary.
fn openness() -> Command {
    Command::cargo_bin("openness").expect("binary should exist")
}

#[test]
fn cli_version_flag() {
    openness()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("openness"));
}

#[test]
fn cli_help_flag() {
    openness()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Openness scoring"));
}

#[test]
fn rank_requires_dataset() {
    openness()
        .arg("rank")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn costs_requires_task() {
    openness()
        .args(["costs", "cycle.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--task"));
}

#[test]
fn score_rejects_found_outside_range() {
    openness()
        .args([
            "score",
            "cycle.json",
            "--task",
            "1",
            "--parameter",
            "1",
            "--found",
            "2",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--found"));
}

#[test]
fn subset_and_parameters_are_mutually_exclusive() {
    openness()
        .args(["rank", "cycle.json", "--subset", "npa", "--parameters", "1,2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_dataset_is_a_runtime_failure() {
    openness()
        .args(["rate", "/nonexistent/cycle.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("dataset not found"));
}
