//! Integration tests for layered Settings loading.
//!
//! Precedence: defaults < global file < local file < PLANSCENE__* env vars.
//! These tests use temp files only and never read the real global config.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use planscene::application::ApplicationError;
use planscene::config::{local_config_path, Settings};

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_local_config_when_load_from_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = write(
        &dir,
        ".planscene.toml",
        r#"
[history]
limit = 25

[defaults]
wall_thickness = 240.0
"#,
    );

    // Act
    let settings = Settings::load_from(None, Some(&local)).expect("load settings");

    // Assert
    assert_eq!(settings.history.limit, 25);
    assert_eq!(settings.defaults.wall_thickness, 240.0);
    assert_eq!(settings.defaults.wall_height, 2800.0, "untouched keys keep defaults");
}

#[test]
fn given_global_and_local_when_load_from_then_local_wins_per_key() {
    let dir = TempDir::new().unwrap();
    let global = write(
        &dir,
        "global.toml",
        r#"
[history]
limit = 10

[defaults]
wall_length = 5000.0
"#,
    );
    let local = write(&dir, ".planscene.toml", "[history]\nlimit = 3\n");

    let settings = Settings::load_from(Some(&global), Some(&local)).expect("load settings");

    assert_eq!(settings.history.limit, 3);
    assert_eq!(settings.defaults.wall_length, 5000.0);
}

#[test]
fn given_project_dir_with_local_file_when_load_then_picked_up() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "[defaults]\nground_width = 6000.0\n").unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.defaults.ground_width, 6000.0);
}

#[test]
fn given_project_dir_without_local_file_when_load_then_succeeds() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path()));

    assert!(settings.is_ok());
}

#[test]
fn given_tilde_script_dir_in_file_when_load_from_then_expanded() {
    let dir = TempDir::new().unwrap();
    let local = write(&dir, ".planscene.toml", "script_dir = \"~/plans\"\n");

    let settings = Settings::load_from(None, Some(&local)).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(settings.script_dir, Some(PathBuf::from(home).join("plans")));
}

#[test]
fn given_malformed_file_when_load_from_then_config_error() {
    let dir = TempDir::new().unwrap();
    let local = write(&dir, ".planscene.toml", "[history\nlimit = ");

    let err = Settings::load_from(None, Some(&local)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_wrong_type_when_load_from_then_config_error() {
    let dir = TempDir::new().unwrap();
    let local = write(&dir, ".planscene.toml", "[history]\nlimit = \"many\"\n");

    let err = Settings::load_from(None, Some(&local)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_env_var_when_load_from_then_overrides_file() {
    // Arrange: door_width is asserted by no other test in this binary
    let dir = TempDir::new().unwrap();
    let local = write(&dir, ".planscene.toml", "[defaults]\ndoor_width = 800.0\n");
    std::env::set_var("PLANSCENE__DEFAULTS__DOOR_WIDTH", "1000");

    // Act
    let result = Settings::load_from(None, Some(&local));
    std::env::remove_var("PLANSCENE__DEFAULTS__DOOR_WIDTH");

    // Assert
    assert_eq!(result.expect("load settings").defaults.door_width, 1000.0);
}

#[test]
fn given_settings_when_rendered_as_toml_then_round_trips() {
    let settings = Settings::load_from(None, None).expect("load defaults");

    let rendered = settings.to_toml().expect("render");
    let parsed: Settings = toml::from_str(&rendered).expect("parse rendered");

    assert_eq!(parsed.history, settings.history);
    assert_eq!(parsed.defaults, settings.defaults);
}
