// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end runs of the binary. Everything goes through the offline
//! provider with an isolated config directory, so no network is touched.

mod helpers;

use assert_cmd::Command;
use helpers::TestRepo;
use predicates::prelude::*;
use tempfile::TempDir;

const KEY_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GEMINI_API_KEY",
    "CHANGEWISE_OPENAI_API_KEY",
    "CHANGEWISE_ANTHROPIC_API_KEY",
    "CHANGEWISE_GEMINI_API_KEY",
    "CHANGEWISE_STYLE",
];

fn changewise(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("changewise").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .current_dir(home.path());
    for var in KEY_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn sample_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit("chore: set up project");
    repo.commit("feat: add dashboard");
    repo.commit("fix: resolve login issue");
    repo
}

#[test]
fn help_lists_subcommands() {
    let home = tempfile::tempdir().unwrap();
    changewise(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("providers"));
}

#[test]
fn completions_for_bash() {
    let home = tempfile::tempdir().unwrap();
    changewise(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("changewise"));
}

#[test]
fn preview_prints_notes_offline() {
    let home = tempfile::tempdir().unwrap();
    let repo = sample_repo();

    changewise(&home)
        .arg("--repo")
        .arg(repo.path())
        .args(["--provider", "offline", "preview", "-n", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Release Notes"))
        .stdout(predicate::str::contains("for last 3 commits."))
        .stdout(predicate::str::contains("## Bug Fixes"))
        .stdout(predicate::str::contains("- Resolve login issue. ("))
        .stdout(predicate::str::contains("## Features"));
}

#[test]
fn preview_respects_type_filter() {
    let home = tempfile::tempdir().unwrap();
    let repo = sample_repo();

    changewise(&home)
        .arg("--repo")
        .arg(repo.path())
        .args(["--provider", "offline", "preview", "--types", "fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Bug Fixes"))
        .stdout(predicate::str::contains("## Features").not())
        .stdout(predicate::str::contains("## Chores").not());
}

#[test]
fn generate_writes_output_file() {
    let home = tempfile::tempdir().unwrap();
    let repo = sample_repo();
    let target = home.path().join("out").join("NOTES.md");

    changewise(&home)
        .arg("--repo")
        .arg(repo.path())
        .args(["--provider", "offline", "generate", "--group-by-author", "-o"])
        .arg(&target)
        .assert()
        .success()
        .stderr(predicate::str::contains("written to"));

    let notes = std::fs::read_to_string(&target).unwrap();
    assert!(notes.starts_with("# Release Notes\n"));
    assert!(notes.contains("## Ada Lovelace"));
    assert!(notes.contains("- **fix**: Resolve login issue."));
}

#[test]
fn missing_branch_fails_naming_it() {
    let home = tempfile::tempdir().unwrap();
    let repo = sample_repo();

    changewise(&home)
        .arg("--repo")
        .arg(repo.path())
        .args([
            "--provider",
            "offline",
            "preview",
            "--from-branch",
            "master",
            "--to-branch",
            "nope",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn outside_a_repository_fails() {
    let home = tempfile::tempdir().unwrap();
    let not_a_repo = tempfile::tempdir().unwrap();

    changewise(&home)
        .arg("--repo")
        .arg(not_a_repo.path())
        .args(["--provider", "offline", "preview"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("git repository"));
}

#[test]
fn get_key_for_offline_needs_none() {
    let home = tempfile::tempdir().unwrap();
    changewise(&home)
        .args(["get-key", "offline"])
        .assert()
        .success()
        .stderr(predicate::str::contains("needs no API key"));
}

#[test]
fn config_set_round_trips_through_show() {
    let home = tempfile::tempdir().unwrap();

    changewise(&home)
        .args(["config", "set", "base_branch", "develop"])
        .assert()
        .success();

    changewise(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Base branch: develop"));
}

#[test]
fn config_set_rejects_invalid_value() {
    let home = tempfile::tempdir().unwrap();
    changewise(&home)
        .args(["config", "set", "temperature", "9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("temperature"));
}

#[test]
fn verbose_preview_reports_usage_on_stderr() {
    let home = tempfile::tempdir().unwrap();
    let repo = sample_repo();

    changewise(&home)
        .arg("--repo")
        .arg(repo.path())
        .args(["--provider", "offline", "--verbose", "preview", "-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage (this process)").not())
        .stderr(predicate::str::contains("Usage (this process)"));
}

#[test]
fn usage_is_not_a_subcommand() {
    let home = tempfile::tempdir().unwrap();
    changewise(&home)
        .arg("usage")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn set_fallback_none_disables_it() {
    let home = tempfile::tempdir().unwrap();

    changewise(&home)
        .args(["set-fallback", "none"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Fallback provider set to none"));

    changewise(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fallback provider: none"));
}

#[test]
fn set_fallback_rejects_unknown_provider() {
    let home = tempfile::tempdir().unwrap();
    changewise(&home)
        .args(["set-fallback", "mystery"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider"));
}
