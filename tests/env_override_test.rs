//! Environment-driven settings. The environment is process-wide and tests
//! in a binary run in parallel, so each test owns a disjoint set of
//! variables.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use alfred_services::config::{Settings, WorkflowVariables};

#[test]
fn given_env_overrides_when_load_from_then_win_over_config_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
helper_timeout_secs = 2
services_cache = "/from/file.plist"

[update]
interval_hours = 6
repo = "someone/fork"
"#,
    )
    .unwrap();

    std::env::set_var("ALFRED_SERVICES__HELPER_TIMEOUT_SECS", "9");
    std::env::set_var("ALFRED_SERVICES__UPDATE__INTERVAL_HOURS", "1");
    std::env::set_var("ALFRED_SERVICES__CLIPBOARD_ARGS", "-Prefer,rtf");
    std::env::set_var("ALFRED_SERVICES__TRACK_DISABLED", "false");

    // Act
    let settings = Settings::load_from(Some(&path));

    std::env::remove_var("ALFRED_SERVICES__HELPER_TIMEOUT_SECS");
    std::env::remove_var("ALFRED_SERVICES__UPDATE__INTERVAL_HOURS");
    std::env::remove_var("ALFRED_SERVICES__CLIPBOARD_ARGS");
    std::env::remove_var("ALFRED_SERVICES__TRACK_DISABLED");

    // Assert
    let settings = settings.expect("load settings");
    assert_eq!(settings.helper_timeout_secs, 9);
    assert_eq!(settings.update.interval_hours, 1);
    assert_eq!(settings.clipboard_args, vec!["-Prefer", "rtf"]);
    assert!(!settings.track_disabled);
    // file values without an override survive
    assert_eq!(settings.services_cache, PathBuf::from("/from/file.plist"));
    assert_eq!(settings.update.repo, "someone/fork");
}

#[test]
fn given_empty_workflow_variables_when_from_env_then_treated_as_unset() {
    std::env::set_var("PBOARD_TYPES", "");
    std::env::set_var("CLIPBOARD", "");
    let empty = WorkflowVariables::from_env();

    std::env::set_var("PBOARD_TYPES", "public.url|public.plain-text");
    std::env::set_var("CLIPBOARD", "https://example.com");
    let set = WorkflowVariables::from_env();

    std::env::remove_var("PBOARD_TYPES");
    std::env::remove_var("CLIPBOARD");

    assert_eq!(empty, WorkflowVariables::default());
    assert_eq!(set.pboard_types.as_deref(), Some("public.url|public.plain-text"));
    assert_eq!(set.clipboard.as_deref(), Some("https://example.com"));
}
