//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use expect_test::Expect;
use pika::tree::Program;
use std::io::Write;

/// Create a new command for the pika binary.
pub fn pika_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pika"))
}

/// Create a temporary file with the given content and file suffix.
pub fn temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Create a temporary `.json` file holding a typed program tree.
pub fn tree_file(program: &Program) -> tempfile::NamedTempFile {
    temp_file(&serde_json::to_string_pretty(program).unwrap(), ".json")
}

/// Create a temporary `.asm` file.
pub fn asm_file(text: &str) -> tempfile::NamedTempFile {
    temp_file(text, ".asm")
}

/// Run a command and check that stdout matches the expected output.
pub fn check_stdout(args: &[&str], stdin: Option<&str>, expected: Expect) {
    let mut cmd = pika_command();
    cmd.args(args);
    if let Some(input) = stdin {
        cmd.write_stdin(input);
    }
    let output = cmd.output().expect("failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    expected.assert_eq(&stdout);
}

/// Run a command and check that stderr matches the expected output.
pub fn check_stderr(args: &[&str], stdin: Option<&str>, expected: Expect) {
    let mut cmd = pika_command();
    cmd.args(args);
    if let Some(input) = stdin {
        cmd.write_stdin(input);
    }
    let output = cmd.output().expect("failed to execute command");
    let stderr = String::from_utf8_lossy(&output.stderr);
    expected.assert_eq(&stderr);
}
