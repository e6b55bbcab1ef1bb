//! Integration tests for the stretch_cli binary.
//!
//! These tests verify end-to-end behavior including:
//! - Session run and logging workflow
//! - Progress derivation across invocations
//! - CSV rollup operations
//! - Settings and habit-anchor persistence

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stretchflow"))
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Guided stretching sessions with progress tracking",
        ));
}

#[test]
fn test_start_fast_logs_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--preset")
        .arg("desk")
        .arg("--fast")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session logged"));

    // Verify journal and state snapshot were written
    let journal_path = data_dir.join("journal/sessions.jsonl");
    let journal_content = fs::read_to_string(&journal_path).expect("Failed to read journal");
    let entry: serde_json::Value =
        serde_json::from_str(journal_content.lines().next().unwrap()).unwrap();
    assert_eq!(entry["context"], "desk");
    assert_eq!(entry["completed"], true);
    // Desk Break: 30s + 45s + 30s
    assert_eq!(entry["total_duration_seconds"], 105);

    assert!(data_dir.join("journal/state.json").exists());
}

#[test]
fn test_dry_run_does_not_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--preset")
        .arg("morning")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!data_dir.join("journal/sessions.jsonl").exists());
}

#[test]
fn test_abandoned_session_not_recorded() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--preset")
        .arg("desk")
        .arg("--fast")
        .arg("--abandon-after")
        .arg("5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session abandoned"));

    assert!(!data_dir.join("journal/sessions.jsonl").exists());

    cli()
        .arg("progress")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions completed: 0"));
}

#[test]
fn test_end_to_end_two_exercise_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    // Two 30-second stretches, no preset context
    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--exercise")
        .arg("neck-side-stretch")
        .arg("--exercise")
        .arg("wrist-circles")
        .arg("--fast")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session logged"))
        .stdout(predicate::str::contains("Total sessions: 1"));

    // 60 seconds of stretching rounds to one minute
    cli()
        .arg("progress")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions completed: 1"))
        .stdout(predicate::str::contains("Minutes stretched:  1"))
        .stdout(predicate::str::contains("Current streak:     1 day(s)"));
}

#[test]
fn test_unknown_exercise_id_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("--exercise")
        .arg("no-such-stretch")
        .arg("--fast")
        .assert()
        .failure();
}

#[test]
fn test_first_session_unlocks_achievement() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("--preset")
        .arg("evening")
        .arg("--fast")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Achievement unlocked: First Stretch",
        ));

    cli()
        .arg("progress")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("First Stretch"));
}

#[test]
fn test_seeded_quick_pick_is_reproducible() {
    let temp_dir = setup_test_dir();

    let run = || {
        let output = cli()
            .arg("start")
            .arg("--data-dir")
            .arg(temp_dir.path())
            .arg("--seed")
            .arg("11")
            .arg("--dry-run")
            .output()
            .expect("Failed to run");
        String::from_utf8(output.stdout).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert!(first.contains("(quick)"));
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    for _ in 0..2 {
        cli()
            .arg("start")
            .arg("--data-dir")
            .arg(&data_dir)
            .arg("--preset")
            .arg("desk")
            .arg("--fast")
            .assert()
            .success();
    }

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 2 session(s)"));

    assert!(data_dir.join("sessions.csv").exists());
    assert!(!data_dir.join("journal/sessions.jsonl").exists());

    // Progress still sees the archived sessions
    cli()
        .arg("progress")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions completed: 2"));
}

#[test]
fn test_rollup_cleanup_removes_processed_journals() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("start")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--preset")
        .arg("desk")
        .arg("--fast")
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed"));

    assert!(!data_dir
        .join("journal/sessions.jsonl.processed")
        .exists());
}

#[test]
fn test_anchor_crud_workflow() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("add")
        .arg("after-lunch")
        .arg("--name")
        .arg("After lunch")
        .arg("--trigger")
        .arg("After lunch")
        .arg("--exercise")
        .arg("cat-cow-stretch")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added habit anchor"));

    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("after-lunch"))
        .stdout(predicate::str::contains("active"));

    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("update")
        .arg("after-lunch")
        .arg("--active")
        .arg("false")
        .assert()
        .success();

    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("inactive"));

    // Deleting an unknown id is a harmless no-op
    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("delete")
        .arg("missing")
        .assert()
        .success();

    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("delete")
        .arg("after-lunch")
        .assert()
        .success();

    cli()
        .arg("anchor")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No habit anchors"));
}

#[test]
fn test_settings_update_persists() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("settings")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--weekly-goal")
        .arg("3")
        .arg("--theme")
        .arg("dark")
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings updated"));

    // Re-read in a fresh process
    cli()
        .arg("settings")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly goal:      3 sessions"))
        .stdout(predicate::str::contains("Dark"));
}

#[test]
fn test_settings_show_defaults() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("settings")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly goal:      5 sessions"))
        .stdout(predicate::str::contains("on at 09:00"))
        .stdout(predicate::str::contains("System"))
        .stdout(predicate::str::contains("Default duration: 1m"));
}

#[test]
fn test_catalog_lists_exercises() {
    cli()
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("neck-side-stretch"))
        .stdout(predicate::str::contains("morning-energizer"));

    cli()
        .arg("catalog")
        .arg("--category")
        .arg("wrists")
        .assert()
        .success()
        .stdout(predicate::str::contains("wrist-circles"))
        .stdout(predicate::str::contains("prayer-stretch"))
        .stdout(predicate::str::contains("neck-side-stretch").not());
}
