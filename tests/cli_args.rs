//! Integration tests for CLI argument handling
//!
//! Exercises flag parsing and the unconfigured-credential error path from
//! the command line. No test here talks to the network.

use std::process::Command;

use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_skycast"))
        .args(args)
        .output()
        .expect("Failed to execute skycast")
}

/// Helper to run the CLI with an empty home so no stored key leaks in
fn run_cli_isolated(args: &[&str]) -> std::process::Output {
    let home = TempDir::new().expect("Failed to create temp home");
    Command::new(env!("CARGO_BIN_EXE_skycast"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("SKYCAST_API_KEY")
        .output()
        .expect("Failed to execute skycast")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("skycast"), "Help should mention skycast");
    assert!(stdout.contains("current"), "Help should list current");
    assert!(stdout.contains("outlook"), "Help should list outlook");
    assert!(stdout.contains("refresh"), "Help should list refresh");
    assert!(
        stdout.contains("set-interval"),
        "Help should list set-interval"
    );
    assert!(stdout.contains("watch"), "Help should list watch");
    assert!(stdout.contains("configure"), "Help should list configure");
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("skycast"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = run_cli(&["moonphase"]);
    assert!(!output.status.success(), "Expected unknown subcommand to fail");
}

#[test]
fn test_non_numeric_interval_prints_error_and_exits() {
    let output = run_cli(&["set-interval", "soon"]);
    assert!(
        !output.status.success(),
        "Expected non-numeric interval to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("Invalid"),
        "Should print an error about the invalid value: {}",
        stderr
    );
}

#[test]
fn test_lat_without_lon_is_rejected() {
    let output = run_cli(&["current", "--lat", "51.5"]);
    assert!(!output.status.success(), "Expected --lat alone to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--lon"),
        "Error should point at the missing --lon: {}",
        stderr
    );
}

#[test]
fn test_place_conflicts_with_here() {
    let output = run_cli(&["current", "--place", "London", "--here"]);
    assert!(
        !output.status.success(),
        "Expected conflicting location flags to fail"
    );
}

#[test]
fn test_missing_api_key_points_at_configure() {
    let output = run_cli_isolated(&["refresh"]);
    assert!(
        !output.status.success(),
        "Expected a run without credentials to fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("configure") || stderr.contains("SKYCAST_API_KEY"),
        "Error should explain how to set a key: {}",
        stderr
    );
}
