//! Common test utilities for integration tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Get the path to the compiled iiify binary
pub fn get_binary_path() -> PathBuf {
    let binary_path = PathBuf::from(env!("CARGO_BIN_EXE_iiify"));

    assert!(
        binary_path.exists(),
        "Binary not found at {:?}. Please build the project first with 'cargo build'",
        binary_path
    );

    binary_path
}

/// A scratch settings location so tests never touch the user's configuration
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temporary directory"),
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.dir.path().join("iiify-settings.json")
    }

    /// Run the iiify binary with the given arguments and wait for it
    ///
    /// # Arguments
    /// * `args` - Command line arguments to pass to the binary
    ///
    /// # Returns
    /// * `Output` - Exit status, stdout and stderr of the process
    pub fn run(&self, args: &[&str]) -> Output {
        run_with_settings(&self.settings_file(), args)
    }
}

fn run_with_settings(settings_file: &Path, args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .env("IIIFY_SETTINGS_FILE", settings_file)
        .env("IIIFY_LOG_LEVEL", "WARN")
        .output()
        .expect("Failed to run iiify process")
}

/// Parse the stdout of a finished process as JSON
pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Check if integration tests should run
///
/// Integration tests are controlled by the environment variable RUN_INTEGRATION_TESTS.
/// Set RUN_INTEGRATION_TESTS=1 to enable network-dependent integration tests.
///
/// # Returns
/// * `bool` - true if integration tests should run, false otherwise
pub fn should_run_integration_tests() -> bool {
    std::env::var("RUN_INTEGRATION_TESTS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Check if a string contains any of the given patterns
#[allow(dead_code)]
pub fn contains_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|&pattern| text.contains(pattern))
}
