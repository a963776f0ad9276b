//! Tool settings management
//!
//! This module handles loading settings from multiple sources,
//! validation, and persistence.

use crate::error::{HservError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory that holds one folder per project
    pub base_path: PathBuf,
    /// Project used when none is given on the command line
    pub project: String,
    /// Remote docker directory, when it differs from `<base_path>/<project>/supabase/docker`
    pub docker_dir: Option<String>,
    pub output_json: bool,
    pub no_color: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            project: String::new(),
            docker_dir: None,
            output_json: false,
            no_color: false,
            debug: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(HservError::config(
                "No project specified. Use --project, set HSERV_PROJECT, or configure 'project'",
            ));
        }

        if self.project.contains(['/', '\\']) {
            return Err(HservError::config(format!(
                "Project name '{}' must not contain path separators",
                self.project
            )));
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| HservError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("hserv").join("hserv.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| HservError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("hserv").join("hserv.toml"))
        }
    }

    /// Change one setting by name, as done by `hserv config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "base_path" => {
                self.base_path = PathBuf::from(value);
            }
            "project" => {
                self.project = value.to_string();
            }
            "docker_dir" => {
                self.docker_dir = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "output_json" => {
                self.output_json = parse_flag(value);
            }
            "no_color" => {
                self.no_color = parse_flag(value);
            }
            "debug" => {
                self.debug = parse_flag(value);
            }
            _ => {
                return Err(HservError::config(format!(
                    "Unknown setting: {key}. Available settings: base_path, project, docker_dir, output_json, no_color, debug"
                )));
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

/// Load settings from multiple sources with priority order:
/// 1. Command-line flags (applied by the caller)
/// 2. Environment variables
/// 3. Settings file
/// 4. Default values
pub fn load_settings() -> Result<Settings> {
    let path = Settings::get_config_path()?;
    load_settings_from(&path)
}

/// Same as [`load_settings`] with an explicit settings file
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let mut settings = if path.exists() {
        load_from_file(path)?
    } else {
        Settings::default()
    };

    load_from_env(&mut settings);
    Ok(settings)
}

fn load_from_file(path: &Path) -> Result<Settings> {
    let contents = std::fs::read_to_string(path)?;
    debug!("Loading settings from {}", path.display());

    // Try to parse as TOML first, then JSON as fallback
    match toml::from_str::<Settings>(&contents) {
        Ok(settings) => Ok(settings),
        Err(toml_error) => serde_json::from_str::<Settings>(&contents).map_err(|_| toml_error.into()),
    }
}

fn load_from_env(settings: &mut Settings) {
    if let Ok(value) = std::env::var("DEBUG") {
        settings.debug = parse_flag(value.as_str());
    }

    if let Ok(value) = std::env::var("HSERV_BASE_PATH") {
        settings.base_path = PathBuf::from(value);
    }

    if let Ok(value) = std::env::var("HSERV_PROJECT") {
        settings.project = value;
    }

    if let Ok(value) = std::env::var("HSERV_DOCKER_DIR") {
        settings.docker_dir = Some(value);
    }

    if std::env::var_os("NO_COLOR").is_some() {
        settings.no_color = true;
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = Settings::get_config_path()?;
    save_settings_to(settings, &path)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(settings)?;
    std::fs::write(path, contents)?;

    Ok(())
}
