//! Integration tests for CLI behaviour that needs no network access
//!
//! ```bash
//! cargo test --test cli_offline
//! ```

mod common;

use common::Sandbox;

#[test]
fn test_show_config_creates_settings_file() {
    let sandbox = Sandbox::new();
    assert!(!sandbox.settings_file().exists());

    let output = sandbox.run(&["show-config"]);
    assert!(output.status.success());
    assert!(sandbox.settings_file().exists());

    let settings = common::stdout_json(&output);
    assert_eq!(settings["archive"]["base_url"], "https://archive.org");
    assert_eq!(settings["presentation"]["label_language"], "none");
}

#[test]
fn test_invalid_identifier_exits_with_code_3() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["manifest", "../etc/passwd"]);

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(common::contains_any(&stderr, &["Invalid identifier"]));
}

#[test]
fn test_unsupported_api_version_is_rejected() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["resolve", "goody$1", "--api-version", "4"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_help_lists_commands() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--help"]);
    assert!(output.status.success());

    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["manifest", "manifest2", "collection", "annotations", "search", "vtt", "resolve"] {
        assert!(help.contains(command), "help should list {}", command);
    }
}
