//! Smoke tests for the pagecheck CLI
//!
//! Runs use the mock backend, so no browser is needed.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the pagecheck binary
fn pagecheck() -> Command {
    let mut cmd = Command::cargo_bin("pagecheck").expect("pagecheck binary should exist");
    for key in [
        "PAGECHECK_CONFIG",
        "PAGECHECK_LOGIN_URL",
        "PAGECHECK_PROJECTS_URL",
        "PAGECHECK_PROJECTS_PATH",
        "PAGECHECK_TIMEOUT_SECS",
        "PAGECHECK_RESULTS_DIR",
        "RUST_LOG",
    ] {
        let _ = cmd.env_remove(key);
    }
    cmd
}

/// A fast-polling suite config inside `dir`
fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("suite.yaml");
    let yaml = format!(
        "login_url: https://app.example.test/\n\
         projects_url: https://app.example.test/lk/projects\n\
         default_timeout_secs: 2\n\
         poll_interval_ms: 20\n\
         results_dir: {}\n",
        dir.path().join("allure-results").display()
    );
    fs::write(&path, yaml).unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    pagecheck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    pagecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("locators"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_shows_help() {
    pagecheck().assert().failure();
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_mock_run_passes_and_writes_reports() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let output = dir.path().join("reports");

    pagecheck()
        .args(["--color", "never", "run", "--backend", "mock", "--config"])
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED 8 scenarios"));

    assert!(output.join("report.html").exists());
    assert!(output.join("report.json").exists());
    assert!(output.join("junit.xml").exists());
    let results = fs::read_dir(dir.path().join("allure-results")).unwrap().count();
    assert_eq!(results, 8);
}

#[test]
fn test_mock_run_with_filter() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    pagecheck()
        .args(["--color", "never", "run", "--backend", "mock", "--filter", "empty_"])
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("reports"))
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED 3 scenarios"));
}

#[test]
fn test_unmatched_filter_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    pagecheck()
        .args(["run", "--backend", "mock", "--filter", "no_such_scenario"])
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scenario matches"));
}

#[test]
fn test_failing_suite_exits_one() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    // the demo site redirects to /lk/projects, never to this path
    pagecheck()
        .env("PAGECHECK_PROJECTS_PATH", "/never")
        .args(["--quiet", "run", "--backend", "mock", "--filter", "successful_login_url_check"])
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(dir.path().join("reports"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("1 of 1 scenarios failed"));
}

#[test]
fn test_missing_config_file() {
    pagecheck()
        .args(["run", "--backend", "mock", "--config", "/nonexistent/suite.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("I/O error"));
}

// ============================================================================
// Locators and config
// ============================================================================

#[test]
fn test_locators_text() {
    pagecheck()
        .args(["locators", "--page", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("email input"))
        .stdout(predicate::str::contains("login button"));
}

#[test]
fn test_locators_json() {
    let output = pagecheck()
        .args(["locators", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listing: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let pages: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["page"].as_str().unwrap())
        .collect();
    assert!(pages.contains(&"login"));
    assert!(pages.contains(&"common"));
}

#[test]
fn test_locators_unknown_page() {
    pagecheck()
        .args(["locators", "--page", "checkout"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown page"));
}

#[test]
fn test_config_shows_overrides() {
    pagecheck()
        .env("PAGECHECK_LOGIN_URL", "https://staging.example.test/")
        .args(["config", "--launch-args"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://staging.example.test/"))
        .stdout(predicate::str::contains("--window-size=1920,1080"));
}
