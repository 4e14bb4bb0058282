//! Shared integration-test harness for running the `scopecfg` binary
//! against fixture files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Returns the path to a test fixture.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Returns a fixture path as a string argument.
#[must_use]
pub fn fixture_arg(name: &str) -> String {
    fixture_path(name).to_string_lossy().into_owned()
}

/// Runs the binary to completion with `args` and returns its output.
///
/// Inherited `SCOPECFG_*` variables are cleared so the developer's
/// environment cannot change results.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scopecfg"))
        .args(args)
        .env_remove("SCOPECFG_CONFIG")
        .env_remove("SCOPECFG_LOG_LEVEL")
        .env_remove("SCOPECFG_COLOR")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run scopecfg")
}

/// Stdout as a string.
#[must_use]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as a string.
#[must_use]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
