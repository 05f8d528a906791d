//! Integration tests for the ppgym binary.
//!
//! These tests verify end-to-end behavior including:
//! - Program selection and rotation
//! - The session workflow (start, toggle, weight, finish)
//! - History, statistics and CSV export
//! - Persistence across invocations

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ppgym"))
}

/// Run a command against `data_dir` and return its stdout
fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let output = cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("stdout is not UTF-8")
}

/// Start a session and return its id
fn start(data_dir: &Path, template: &str) -> String {
    let stdout = run_ok(data_dir, &["start", template]);
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Session: "))
        .map(str::to_string)
        .expect("session id in start output")
}

fn read_key(data_dir: &Path, key: &str) -> Value {
    let contents = fs::read_to_string(data_dir.join(format!("{}.json", key)))
        .unwrap_or_else(|_| panic!("Failed to read {}", key));
    serde_json::from_str(&contents).expect("stored value is JSON")
}

fn history_json(data_dir: &Path) -> Vec<Value> {
    let stdout = run_ok(data_dir, &["history", "--json"]);
    serde_json::from_str(&stdout).expect("history output is JSON")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Workout rotation and session tracker",
        ));
}

#[test]
fn test_default_command_without_program() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No program selected"));
}

#[test]
fn test_select_program_shows_rotation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let stdout = run_ok(data_dir, &["program", "pedro"]);
    assert!(stdout.contains("Selected program Pedro"));
    assert!(stdout.contains("Rotation starts at: A — Pernas + Core"));
    assert_eq!(read_key(data_dir, "selected_program"), "pedro");

    let stdout = run_ok(data_dir, &["today"]);
    assert!(stdout.contains("Today:    A — Pernas + Core"));
    assert!(stdout.contains("Tomorrow: B — Peito + Tríceps"));
    assert!(stdout.contains("Completed workouts: 0"));

    let stdout = run_ok(data_dir, &["program"]);
    assert!(stdout.contains("→ A — Pernas + Core"));
}

#[test]
fn test_unknown_program_rejected() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .args(["program", "carla"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown program"));
}

#[test]
fn test_clear_program_selection() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_ok(data_dir, &["program", "georgia"]);
    let stdout = run_ok(data_dir, &["program", "--clear"]);
    assert!(stdout.contains("Program selection cleared"));
    assert!(!data_dir.join("selected_program.json").exists());
}

#[test]
fn test_templates_listing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let stdout = run_ok(data_dir, &["templates"]);
    assert_eq!(stdout.lines().count(), 9);

    let stdout = run_ok(data_dir, &["templates", "--program", "georgia"]);
    let ids: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(
        ids,
        vec![
            "georgia-template-a",
            "georgia-template-b",
            "georgia-template-c",
            "georgia-template-d"
        ]
    );

    let stdout = run_ok(data_dir, &["templates", "--category", "pull"]);
    assert!(stdout.contains("template-c"));
    assert!(stdout.contains("georgia-template-d"));
    assert!(!stdout.contains("template-a "));

    let stdout = run_ok(
        data_dir,
        &["templates", "--program", "georgia", "--category", "legs"],
    );
    let ids: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(ids, vec!["georgia-template-a", "georgia-template-c"]);

    let stdout = run_ok(data_dir, &["templates", "--category", "cardio"]);
    assert!(stdout.contains("No matching templates."));
}

#[test]
fn test_full_session_workflow() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_ok(data_dir, &["program", "georgia"]);

    // Start today's template
    let stdout = run_ok(data_dir, &["start"]);
    assert!(stdout.contains("Started Georgia A — Pernas Completo"));
    assert!(stdout.contains("Agachamento livre  4x12 @ 0 kg  [ ][ ][ ][ ]"));

    let stdout = run_ok(data_dir, &["toggle", "1", "1"]);
    assert!(stdout.contains("✓ Agachamento livre set 1"));
    assert!(stdout.contains("Sets: 1/20"));

    let stdout = run_ok(data_dir, &["weight", "1", "42,5"]);
    assert!(stdout.contains("Agachamento livre: 42.5 kg"));

    let stdout = run_ok(data_dir, &["show"]);
    assert!(stdout.contains("@ 42.5 kg  [x][ ][ ][ ]"));

    let stdout = run_ok(data_dir, &["finish", "--minutes", "50"]);
    assert!(stdout.contains("Workout completed in 50 min"));
    assert!(stdout.contains("Next workout: Georgia B — Ombro/Bíceps/Peito"));

    assert_eq!(read_key(data_dir, "completed_workouts_count"), 1);

    let history = history_json(data_dir);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["workoutName"], "Georgia A — Pernas Completo");
    assert_eq!(history[0]["templateId"], "georgia-template-a");
    assert_eq!(history[0]["completed"], true);
    assert_eq!(history[0]["durationMinutes"], 50);
    assert_eq!(history[0]["exercises"][0]["weight"], 42.5);
    assert_eq!(
        history[0]["exercises"][0]["completedSets"],
        serde_json::json!([1, 0, 0, 0])
    );

    let stdout = run_ok(data_dir, &["today"]);
    assert!(stdout.contains("Today's workout is done"));
    assert!(stdout.contains("Completed workouts: 1"));
}

#[test]
fn test_toggle_twice_restores_set() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let session = start(data_dir, "template-b");

    run_ok(data_dir, &["toggle", "2", "3", "--session", &session]);
    let stdout = run_ok(data_dir, &["toggle", "2", "3", "--session", &session]);
    assert!(stdout.contains("○ Supino inclinado set 3"));
    assert!(stdout.contains("Sets: 0/"));
}

#[test]
fn test_exercise_by_name() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir, "template-c");

    let stdout = run_ok(data_dir, &["toggle", "rosca martelo", "2"]);
    assert!(stdout.contains("✓ Rosca martelo set 2"));
}

#[test]
fn test_start_unknown_template_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["start", "missing-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template not found: missing-id"));

    // Nothing was created
    assert!(!data_dir.join("workout_sessions.json").exists());
}

#[test]
fn test_start_without_program_needs_template() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No program selected"));
}

#[test]
fn test_negative_weight_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir, "template-b");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["weight", "1", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid weight"));

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["weight", "1", "heavy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid weight"));

    let stdout = run_ok(data_dir, &["show"]);
    assert!(stdout.contains("Supino reto  4x8 @ 0 kg"));

    let stdout = run_ok(data_dir, &["weight", "1", "-0"]);
    assert!(stdout.contains("Supino reto: 0 kg"));
    assert!(!stdout.contains("-0 kg"));
}

#[test]
fn test_set_out_of_range() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir, "template-c");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["toggle", "1", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    // Set numbers start at 1
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["toggle", "1", "0"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_exercise() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir, "template-d");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["toggle", "42", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Exercise 42 not found"));
}

#[test]
fn test_finish_twice_counts_once() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let session = start(data_dir, "template-a");

    run_ok(data_dir, &["finish", &session, "--minutes", "30"]);
    let stdout = run_ok(data_dir, &["finish", &session, "--minutes", "90"]);
    assert!(stdout.contains("already completed"));

    assert_eq!(read_key(data_dir, "completed_workouts_count"), 1);
    assert_eq!(history_json(data_dir)[0]["durationMinutes"], 30);
}

#[test]
fn test_toggle_after_finish_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let session = start(data_dir, "template-a");
    run_ok(data_dir, &["finish", &session, "--minutes", "30"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["toggle", "1", "1", "--session", &session])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already completed"));
}

#[test]
fn test_delete_completed_session_rewinds_rotation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    run_ok(data_dir, &["program", "pedro"]);

    let session = start(data_dir, "template-a");
    run_ok(data_dir, &["finish", &session, "--minutes", "45"]);
    assert_eq!(read_key(data_dir, "completed_workouts_count"), 1);

    // Unique prefixes are accepted
    let stdout = run_ok(data_dir, &["delete", &session[..8]]);
    assert!(stdout.contains("Deleted session"));
    assert_eq!(read_key(data_dir, "completed_workouts_count"), 0);
    assert!(history_json(data_dir).is_empty());

    let stdout = run_ok(data_dir, &["program"]);
    assert!(stdout.contains("→ A — Pernas + Core"));
}

#[test]
fn test_delete_unknown_session_is_noop() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir, "template-a");

    let stdout = run_ok(
        data_dir,
        &["delete", "00000000-0000-0000-0000-000000000000"],
    );
    assert!(stdout.contains("nothing deleted"));

    let sessions = read_key(data_dir, "workout_sessions");
    assert_eq!(sessions.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_weight_carries_forward_to_next_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let first = start(data_dir, "template-a");
    run_ok(data_dir, &["weight", "mesa flexora", "35"]);
    run_ok(data_dir, &["finish", &first, "--minutes", "40"]);

    let stdout = run_ok(data_dir, &["start", "template-e"]);
    assert!(stdout.contains("Mesa flexora  3x11 @ 35 kg"));

    let weights = read_key(data_dir, "exercise_weights");
    assert_eq!(weights["mesa flexora"]["lastWeight"], 35.0);
}

#[test]
fn test_stats_json() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let first = start(data_dir, "template-a");
    run_ok(data_dir, &["finish", &first, "--minutes", "40"]);
    let second = start(data_dir, "georgia-template-b");
    run_ok(data_dir, &["finish", &second, "--minutes", "60"]);
    start(data_dir, "template-c");

    let stdout = run_ok(data_dir, &["stats", "--json"]);
    let stats: Value = serde_json::from_str(&stdout).expect("stats output is JSON");

    assert_eq!(stats["totalWorkouts"], 2);
    assert_eq!(stats["totalSessions"], 3);
    assert_eq!(stats["averageDurationMinutes"], 50.0);
    assert_eq!(stats["currentStreak"], 1);
    assert_eq!(stats["perProgram"]["pedro"], 1);
    assert_eq!(stats["perProgram"]["georgia"], 1);
    assert_eq!(stats["favoriteProgram"], Value::Null);

    let stdout = run_ok(data_dir, &["stats"]);
    assert!(stdout.contains("Workouts:          2"));
}

#[test]
fn test_export_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let session = start(data_dir, "template-b");
    run_ok(data_dir, &["finish", &session, "--minutes", "35"]);

    let stdout = run_ok(data_dir, &["export"]);
    assert!(stdout.contains("Exported 1 workouts (7 rows)"));

    let csv_content =
        fs::read_to_string(data_dir.join("history.csv")).expect("Failed to read CSV");
    assert!(csv_content.starts_with("session_id,"));
    assert!(csv_content.contains("Supino reto"));
    assert_eq!(csv_content.lines().count(), 8);
}

#[test]
fn test_clear_requires_confirmation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    run_ok(data_dir, &["program", "pedro"]);
    let session = start(data_dir, "template-a");
    run_ok(data_dir, &["finish", &session, "--minutes", "20"]);

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert!(data_dir.join("workout_sessions.json").exists());

    run_ok(data_dir, &["clear", "--yes"]);
    assert!(!data_dir.join("workout_sessions.json").exists());
    assert!(!data_dir.join("completed_workouts_count.json").exists());
    assert!(data_dir.join("selected_program.json").exists());

    let stdout = run_ok(data_dir, &["today"]);
    assert!(stdout.contains("Program: Pedro"));
    assert!(stdout.contains("Completed workouts: 0"));
}
