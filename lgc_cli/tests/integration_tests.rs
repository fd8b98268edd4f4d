//! Integration tests for the lgc binary.
//!
//! These tests verify end-to-end behavior including:
//! - Workout and measurement imports
//! - Conflict review (auto-commit, auto-cancel, prompt)
//! - Dashboard, history and CSV export
//! - Manual workout and check-in logging
//! - Recovery from damaged store files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKOUT_HEADER: &str = "Date,Workout Name,Exercise Name,Set Order,Weight,Reps,RPE";

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI binary, isolated from the user's config
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lgc"));
    cmd.env("HOME", temp_dir.path())
        .env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .env_remove("RUST_LOG")
        .env_remove("LGC_LOG")
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"));
    cmd
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn workout_export(rows: &[&str]) -> String {
    let mut text = String::from(WORKOUT_HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text
}

fn workout_store(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("data").join("store").join("workout_sets.jsonl")
}

fn big_three_export() -> String {
    workout_export(&[
        "2024-03-04 07:00:00,Lower,Squat (Barbell),W,135,5,",
        "2024-03-04 07:00:00,Lower,Squat (Barbell),1,350,1,8",
        "2024-03-04 07:00:00,Lower,Deadlift (Barbell),1,440,1,",
        "2024-03-05 07:00:00,Upper,Bench Press (Barbell),1,240,1,",
        "2024-03-05 07:00:00,Upper,Lat Pulldown (Cable),1,120,10,",
    ])
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Lazy Gains Club strength and body-composition tracker",
        ));
}

#[test]
fn test_workout_import_writes_store() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading workouts.csv..."))
        .stdout(predicate::str::contains("Detected workout file"))
        .stdout(predicate::str::contains("Found 3 unique workout entries"))
        .stdout(predicate::str::contains("Imported 3 workout entries"));

    let store = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert_eq!(store.lines().count(), 3);
    assert!(store.contains("\"e1rm\":350"));
    assert!(store.contains("\"exercise\":\"deadlift\""));
}

#[test]
fn test_unknown_format_is_skipped() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "notes.csv", "Title,Body\nhello,world\n");

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown file format, skipping"))
        .stdout(predicate::str::contains("Nothing imported"));

    assert!(!workout_store(&temp_dir).exists());
}

#[test]
fn test_missing_file_fails() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("import")
        .arg(temp_dir.path().join("does-not-exist.csv"))
        .assert()
        .failure();
}

#[test]
fn test_reimport_with_yes_keeps_stronger_entries() {
    let temp_dir = setup_test_dir();
    let first = write_file(temp_dir.path(), "first.csv", &big_three_export());
    let second = write_file(
        temp_dir.path(),
        "second.csv",
        &workout_export(&[
            "2024-03-04 07:00:00,Lower,Squat (Barbell),1,280,1,",
            "2024-03-05 07:00:00,Upper,Bench Press (Barbell),1,250,1,",
        ]),
    );

    cli(&temp_dir).arg("import").arg(&first).assert().success();

    cli(&temp_dir)
        .arg("import")
        .arg(&second)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 entries that already exist"))
        .stdout(predicate::str::contains("keep existing"))
        .stdout(predicate::str::contains("-> replace"));

    let store = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert_eq!(store.lines().count(), 3);
    assert!(store.contains("\"e1rm\":350"));
    assert!(store.contains("\"e1rm\":250"));
    assert!(!store.contains("\"e1rm\":240"));
}

#[test]
fn test_cancel_leaves_store_untouched() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    cli(&temp_dir).arg("import").arg(&file).assert().success();
    let before = fs::read_to_string(workout_store(&temp_dir)).unwrap();

    let stronger = write_file(
        temp_dir.path(),
        "stronger.csv",
        &workout_export(&["2024-03-04 07:00:00,Lower,Squat (Barbell),1,350,5,"]),
    );

    cli(&temp_dir)
        .arg("import")
        .arg(&stronger)
        .arg("--cancel")
        .assert()
        .success()
        .stdout(predicate::str::contains("Import cancelled, nothing was saved"));

    let after = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_prompt_declined_cancels() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    cli(&temp_dir).arg("import").arg(&file).assert().success();

    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 existing entries: 0 would be replaced, 3 kept."))
        .stdout(predicate::str::contains("Import cancelled."));
}

#[test]
fn test_prompt_accepted_commits() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    let stronger = write_file(
        temp_dir.path(),
        "stronger.csv",
        &workout_export(&["2024-03-04 07:00:00,Lower,Squat (Barbell),1,385,1,"]),
    );

    cli(&temp_dir).arg("import").arg(&file).assert().success();

    cli(&temp_dir)
        .arg("import")
        .arg(&stronger)
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 existing entries: 1 would be replaced, 0 kept."))
        .stdout(predicate::str::contains("Imported 1 of 1 entries"));

    let store = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert_eq!(store.lines().count(), 3);
    assert!(store.contains("\"e1rm\":385"));
}

#[test]
fn test_measurement_import_and_dashboard() {
    let temp_dir = setup_test_dir();
    let workouts = write_file(temp_dir.path(), "workouts.csv", &big_three_export());
    let measurements = write_file(
        temp_dir.path(),
        "measurements.csv",
        "Date,Measurement Type,Value,Unit\n\
2024-03-04 06:30:00,Body Weight,182.4,lbs\n\
2024-03-04 06:30:00,Waist,33,in\n",
    );

    cli(&temp_dir).arg("import").arg(&workouts).assert().success();
    cli(&temp_dir)
        .arg("import")
        .arg(&measurements)
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected measurement file"))
        .stdout(predicate::str::contains("Imported 1 check-in entries"));

    // (350 + 240 + 440) / 33 * 10
    cli(&temp_dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("LGC SCORE  312.1"))
        .stdout(predicate::str::contains("Squat     350"))
        .stdout(predicate::str::contains("Bench     240"))
        .stdout(predicate::str::contains("Deadlift  440"))
        .stdout(predicate::str::contains("Total     1030"));

    cli(&temp_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mar 2024"))
        .stdout(predicate::str::contains("312.1"));
}

#[test]
fn test_empty_dashboard_and_history() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("LGC SCORE"));

    cli(&temp_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No score history yet"));
}

#[test]
fn test_export_workouts_csv() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());
    let out = temp_dir.path().join("exports").join("workouts.csv");

    cli(&temp_dir).arg("import").arg(&file).assert().success();

    cli(&temp_dir)
        .arg("export")
        .arg("--kind")
        .arg("workouts")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 records"));

    let contents = fs::read_to_string(&out).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("date,exercise,exercise_name,best_weight,best_reps,e1rm,sets")
    );
    assert!(contents.contains("2024-03-04,squat,Squat (Barbell),350.0,1,350,350x1"));
}

#[test]
fn test_users_are_kept_apart() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    cli(&temp_dir)
        .args(["--user", "alice", "import"])
        .arg(&file)
        .assert()
        .success();

    // Same rows for another user are new entries, not conflicts
    cli(&temp_dir)
        .args(["--user", "bob", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exist").not())
        .stdout(predicate::str::contains("Imported 3 workout entries"));

    let store = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert_eq!(store.lines().count(), 6);
}

#[test]
fn test_corrupted_store_line_is_skipped() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    cli(&temp_dir).arg("import").arg(&file).assert().success();

    let store_path = workout_store(&temp_dir);
    let mut contents = fs::read_to_string(&store_path).unwrap();
    contents.push_str("{\"id\": \"truncated\n");
    fs::write(&store_path, contents).unwrap();

    cli(&temp_dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat     350"));

    // Identical rows all resolve to keep, so nothing is rewritten
    cli(&temp_dir)
        .arg("import")
        .arg(&file)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 entries that already exist"))
        .stdout(predicate::str::contains("Imported 0 workout entries"));
}

fn checkin_store(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("data").join("store").join("daily_checkins.jsonl")
}

#[test]
fn test_corrupted_line_survives_later_writes() {
    let temp_dir = setup_test_dir();
    let file = write_file(temp_dir.path(), "workouts.csv", &big_three_export());

    cli(&temp_dir).arg("import").arg(&file).assert().success();

    let store_path = workout_store(&temp_dir);
    let mut contents = fs::read_to_string(&store_path).unwrap();
    contents.push_str("{\"id\": \"truncated\n");
    fs::write(&store_path, contents).unwrap();

    cli(&temp_dir)
        .args(["log", "row", "185x8", "--date", "2024-03-06"])
        .assert()
        .success();

    let store = fs::read_to_string(&store_path).unwrap();
    assert_eq!(store.lines().count(), 5);
    assert!(store.contains("{\"id\": \"truncated"));

    cli(&temp_dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat     350"))
        .stdout(predicate::str::contains("Total     1030"));
}

#[test]
fn test_bad_sleep_rating_does_not_lose_checkin() {
    let temp_dir = setup_test_dir();
    let store_path = checkin_store(&temp_dir);
    fs::create_dir_all(store_path.parent().unwrap()).unwrap();
    fs::write(
        &store_path,
        "{\"id\":\"6f1c1f64-5b0e-4a8e-9d3c-0c9f4d2b7a11\",\"user_id\":\"u1\",\"date\":\"2024-02-05\",\
\"weight\":180.0,\"notes\":\"felt good\",\"sleep_quality\":12}\n",
    )
    .unwrap();

    let measurements = write_file(
        temp_dir.path(),
        "measurements.csv",
        "Date,Measurement Type,Value\n2024-02-06 07:00:00,Waist,33\n",
    );

    cli(&temp_dir)
        .args(["--user", "u1", "import"])
        .arg(&measurements)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 check-in entries"));

    let store = fs::read_to_string(&store_path).unwrap();
    assert_eq!(store.lines().count(), 2);
    assert!(store.contains("\"date\":\"2024-02-05\""));
    assert!(store.contains("felt good"));
    assert!(store.contains("\"date\":\"2024-02-06\""));
}

#[test]
fn test_import_with_byte_order_mark_and_invalid_utf8() {
    let temp_dir = setup_test_dir();
    let path = temp_dir.path().join("excel.csv");
    let mut bytes = b"\xef\xbb\xbfDate,Exercise Name,Set Order,Weight,Reps\n".to_vec();
    bytes.extend_from_slice(b"2024-02-01 08:00:00,Bench Press (Barbell) \xe9,1,225,1\n");
    fs::write(&path, bytes).unwrap();

    cli(&temp_dir)
        .arg("import")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 unique workout entries"))
        .stdout(predicate::str::contains("Imported 1 workout entries"));

    let store = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert!(store.contains("\"e1rm\":225"));
}

#[test]
fn test_log_workout_command() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["log", "squat", "225x5", "245x3@8", "--date", "2024-03-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged Squat (Barbell) for 2024-03-04"))
        .stdout(predicate::str::contains("Set 2: 245 x 3 @ RPE 8"))
        .stdout(predicate::str::contains("Best set 245 x 3, e1RM 259"));

    let store = fs::read_to_string(workout_store(&temp_dir)).unwrap();
    assert_eq!(store.lines().count(), 1);
    assert!(store.contains("\"rpe\":8.0"));

    cli(&temp_dir)
        .args(["log", "curls", "50x10"])
        .assert()
        .failure();

    cli(&temp_dir)
        .args(["log", "bench", "225"])
        .assert()
        .failure();
}

#[test]
fn test_checkin_command_merges_fields() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["checkin", "--date", "2024-03-04", "--weight", "180", "--sleep", "8"])
        .args(["--notes", "felt good"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Check-in saved for 2024-03-04"))
        .stdout(predicate::str::contains("Sleep     8/10"));

    cli(&temp_dir)
        .args(["checkin", "--date", "2024-03-04", "--waist", "33"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weight    180"))
        .stdout(predicate::str::contains("Waist     33"))
        .stdout(predicate::str::contains("Notes     felt good"));

    let out = temp_dir.path().join("checkins.csv");
    cli(&temp_dir)
        .args(["export", "--kind", "checkins", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 records"));

    let contents = fs::read_to_string(&out).unwrap();
    assert!(contents.contains("2024-03-04,180.0,33.0,,,8,felt good"));
}

#[test]
fn test_checkin_requires_weight_or_waist() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["checkin", "--sleep", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least a weight or a waist"));

    cli(&temp_dir)
        .args(["checkin", "--weight", "180", "--sleep", "12"])
        .assert()
        .failure();

    assert!(!checkin_store(&temp_dir).exists());
}

#[test]
fn test_plan_lists_training_days() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squat Day"))
        .stdout(predicate::str::contains("Pendlay Row (Barbell)"))
        .stdout(predicate::str::contains("Deadlift Day"));

    cli(&temp_dir)
        .args(["plan", "deadlift"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overhead Press (Barbell)"))
        .stdout(predicate::str::contains("Chin-up").not());
}
