//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/planscene/planscene.toml`
//! 3. Local config: `<project_dir>/.planscene.toml`
//! 4. Environment variables: `PLANSCENE__*` (e.g. `PLANSCENE__HISTORY__LIMIT=50`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::ObjectDefaults;

/// Undo history settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo steps kept, 0 for unbounded
    pub limit: usize,
}

/// Unified configuration for planscene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Directory relative script paths resolve against (default: current dir)
    pub script_dir: Option<PathBuf>,
    pub history: HistoryConfig,
    /// Dimensions of newly created objects
    pub defaults: ObjectDefaults,
}

/// Get the XDG config directory for planscene.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "planscene").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("planscene.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".planscene.toml")
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.script_dir {
            let raw = dir.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.script_dir = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.planscene.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let local = project_dir
            .map(local_config_path)
            .filter(|p| p.exists());
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Load from explicit files; missing layers are skipped.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("history.limit", defaults.history.limit as u64)
            .map_err(config_err)?
            .set_default("defaults.wall_thickness", defaults.defaults.wall_thickness)
            .map_err(config_err)?
            .set_default("defaults.wall_height", defaults.defaults.wall_height)
            .map_err(config_err)?
            .set_default("defaults.wall_length", defaults.defaults.wall_length)
            .map_err(config_err)?
            .set_default("defaults.door_width", defaults.defaults.door_width)
            .map_err(config_err)?
            .set_default("defaults.door_height", defaults.defaults.door_height)
            .map_err(config_err)?
            .set_default("defaults.door_thickness", defaults.defaults.door_thickness)
            .map_err(config_err)?
            .set_default("defaults.ground_width", defaults.defaults.ground_width)
            .map_err(config_err)?
            .set_default("defaults.ground_depth", defaults.defaults.ground_depth)
            .map_err(config_err)?;

        if let Some(path) = global {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = local {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("PLANSCENE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        // Expand ~ and $VAR in path-like fields
        settings.expand_paths();

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# planscene configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/planscene/planscene.toml
#   Local:  <project>/.planscene.toml
#   Env:    PLANSCENE__* environment variables (e.g. PLANSCENE__HISTORY__LIMIT=50)

# Directory relative script paths resolve against
# script_dir = "~/plans"

[history]
# Maximum number of undo steps, 0 keeps everything
# limit = 0

[defaults]
# Dimensions of new objects in millimetres
# wall_thickness = 120.0
# wall_height = 2800.0
# wall_length = 4000.0
# door_width = 900.0
# door_height = 2100.0
# door_thickness = 100.0
# ground_width = 4000.0
# ground_depth = 3000.0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_files_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None).expect("load defaults");
        assert_eq!(settings.history.limit, 0);
        assert_eq!(settings.defaults.wall_thickness, 120.0);
        assert_eq!(settings.script_dir, None);
    }

    #[test]
    fn given_tilde_in_script_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            script_dir: Some(PathBuf::from("~/plans")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.script_dir.unwrap();
        assert!(dir.to_string_lossy().starts_with(&home));
        assert!(!dir.to_string_lossy().contains('~'));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let parsed: Settings = toml::from_str(&Settings::template()).expect("template parses");
        assert_eq!(parsed, Settings::default());
    }
}
