//! End-to-end checks of the binary's exit codes.

use std::process::Command;

fn specterm() -> Command {
    Command::new(env!("CARGO_BIN_EXE_specterm"))
}

#[test]
fn test_no_argument_exits_cleanly() {
    let output = specterm().output().unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_file_exits_with_one() {
    let output = specterm()
        .arg("/nonexistent/dir/missing-track.mp3")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    // No frames were drawn
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing-track.mp3"), "{stderr}");
}

#[test]
fn test_invalid_capacity_exits_with_one() {
    let output = specterm()
        .args(["--samples", "1", "whatever.mp3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
