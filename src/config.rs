//! Configuration management for task-console.
//!
//! Settings are read from an optional `task-console.yaml` file in a base
//! directory and then overridden by environment variables. The resulting
//! [`AppConfig`] is passed explicitly to whatever needs it; nothing here is
//! stored in process-wide state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name relative to the base directory.
pub const CONFIG_FILE_NAME: &str = "task-console.yaml";

/// Directory under the home directory holding the default database.
const DATA_DIR_NAME: &str = ".task-console";

/// Default database file name.
pub const DATABASE_FILENAME: &str = "tasks.sqlite3";

/// Application name shown in the menu header when none is configured.
pub const DEFAULT_APP_NAME: &str = "Task Management Application";

/// Environment variable overriding [`AppConfig::database_path`].
pub const ENV_DATABASE_PATH: &str = "TASKS_DATABASE_PATH";
/// Environment variable overriding [`AppConfig::app_name`].
pub const ENV_APP_NAME: &str = "APP_NAME";
/// Environment variable overriding [`AppConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable overriding [`AppConfig::use_worker`].
pub const ENV_USE_WORKER: &str = "TASKS_USE_WORKER";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Path of the `SQLite` database file. `None` means the default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Name shown at the top of the menu.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Log filter, e.g. `info` or `task_console=debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether mutating operations go through the background worker.
    #[serde(default)]
    pub use_worker: bool,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            app_name: default_app_name(),
            log_level: default_log_level(),
            use_worker: false,
        }
    }
}

impl AppConfig {
    /// Load config from a base directory, returning `None` if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(base_dir: &Path) -> Result<Option<Self>> {
        let config_path = Self::config_path(base_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Load the file config (or defaults) and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or an environment
    /// override is malformed.
    pub fn resolve(base_dir: &Path) -> Result<Self> {
        let config = Self::load_from(base_dir)?.unwrap_or_default();
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by variable name.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `TASKS_USE_WORKER` is not a boolean.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_DATABASE_PATH) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(name) = get(ENV_APP_NAME) {
            self.app_name = name;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level.to_lowercase();
        }
        if let Some(flag) = get(ENV_USE_WORKER) {
            self.use_worker = parse_bool(&flag).ok_or_else(|| {
                Error::Config(format!("{ENV_USE_WORKER} must be true or false, got '{flag}'"))
            })?;
        }
        Ok(self)
    }

    /// Save config to a base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, base_dir: &Path) -> Result<()> {
        let config_path = Self::config_path(base_dir);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// The database path to open: the configured one or the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no path is configured and the home
    /// directory cannot be determined.
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => default_database_path()
                .ok_or_else(|| Error::Config("could not determine home directory".to_string())),
        }
    }

    /// Get the config file path for a base directory.
    pub fn config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE_NAME)
    }
}

/// Default database location: `~/.task-console/tasks.sqlite3`.
#[must_use]
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME).join(DATABASE_FILENAME))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
