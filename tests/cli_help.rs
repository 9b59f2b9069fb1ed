//! E2E tests for the devloop CLI surface

use std::process::Command;

#[test]
fn help_lists_commands() {
    let output = Command::new(env!("CARGO_BIN_EXE_devloop"))
        .arg("--help")
        .output()
        .expect("failed to run devloop");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dev"));
    assert!(stdout.contains("plan"));
}

#[test]
fn unknown_command_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_devloop"))
        .arg("frobnicate")
        .output()
        .expect("failed to run devloop");

    assert!(!output.status.success());
}
