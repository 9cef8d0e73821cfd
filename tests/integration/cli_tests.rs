//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn deadsweep() -> Command {
    Command::cargo_bin("deadsweep").expect("binary builds")
}

/// Copy a fixture into a scratch directory, so no default config is picked up
fn scratch_copy(dir: &TempDir, fixture: &str) -> PathBuf {
    let target = dir.path().join(fixture);
    fs::copy(fixtures_path().join(fixture), &target).expect("fixture copies");
    target
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    deadsweep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadsweep"))
        .stdout(predicate::str::contains("--keep"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn test_cli_version() {
    deadsweep()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadsweep"));
}

#[test]
fn test_missing_input_fails() {
    deadsweep()
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read program"));
}

// ============================================================================
// Shrinking
// ============================================================================

#[test]
fn test_shrink_writes_output() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "app.json");
    let output = dir.path().join("out.json");

    deadsweep()
        .arg(&input)
        .args(["--keep", "FooTest:testBar", "-o"])
        .arg(&output)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.Unused"));

    let shrunk: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let classes: Vec<_> = shrunk["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        classes,
        vec![
            "com.example.FooTest",
            "com.example.Service",
            "com.example.Task",
            "com.example.PrintTask",
            "com.example.Registry",
        ]
    );
}

#[test]
fn test_json_report_on_stdout() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "app.json");

    let assert = deadsweep()
        .arg(&input)
        .args(["--keep", "FooTest:testBar", "--format", "json", "--quiet"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["removed"]["classes"], 2);
    assert_eq!(report["retained"]["classes"], 5);
}

#[test]
fn test_json_report_to_file() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "app.json");
    let report = dir.path().join("report.json");

    deadsweep()
        .arg(&input)
        .args(["--keep", "FooTest:testBar", "-f", "json", "--report"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["annotations_stripped"], 1);
}

#[test]
fn test_config_file_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "app.json");
    fs::copy(fixtures_path().join("keep.yml"), dir.path().join("deadsweep.yml")).unwrap();

    // The config asks for a JSON report and keeps FooTest.testBar
    let assert = deadsweep().arg(&input).arg("-q").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["retained"]["classes"], 5);
}

#[test]
fn test_explicit_config_with_cli_overrides() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "app.json");

    let assert = deadsweep()
        .arg(&input)
        .arg("--config")
        .arg(fixtures_path().join("keep.yml"))
        .args(["--keep-annotation", "Keep", "--parallel", "--bfs", "-q"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // FooTest's closure plus the @Keep class
    assert_eq!(report["retained"]["classes"], 6);
}

#[test]
fn test_unresolved_member_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "broken.json");
    let output = dir.path().join("out.json");

    deadsweep()
        .arg(&input)
        .args(["--entry-point", "com.example.Main", "-o"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("graph construction"));

    assert!(!output.exists());
}

#[test]
fn test_invalid_keep_rule_rejected() {
    let dir = TempDir::new().unwrap();
    let input = scratch_copy(&dir, "app.json");

    deadsweep()
        .arg(&input)
        .args(["--keep", ":testBar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid keep rule"));
}
