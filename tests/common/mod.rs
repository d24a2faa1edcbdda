//! Common test utilities for alsh integration tests.

use assert_cmd::Command;
use std::process::Output;

/// Runs the shell non-interactively (stdin piped, not a tty) against
/// `script` and returns the captured process output.
pub fn run(script: &str) -> Output {
    Command::cargo_bin("alsh")
        .unwrap()
        .write_stdin(script)
        .output()
        .expect("alsh should run")
}

pub fn stdout(script: &str) -> String {
    String::from_utf8(run(script).stdout).expect("stdout should be utf8")
}
