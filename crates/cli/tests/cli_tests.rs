//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "triage-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("pod triage agent"),
        "Should show app description"
    );
    assert!(stdout.contains("namespaces"), "Should show namespaces command");
    assert!(stdout.contains("scan"), "Should show scan command");
    assert!(stdout.contains("status"), "Should show status command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "triage-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("ptri"), "Should show binary name");
}

/// Test scan subcommand help
#[test]
fn test_scan_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "triage-cli", "--", "scan", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Scan help should succeed");
    assert!(
        stdout.contains("--namespace"),
        "Should show namespace option"
    );
}
