//! Workspace configuration.
//!
//! Loaded from `<config dir>/codesnap/config.toml`. Every field has a
//! default, so a partial or missing file is fine.
//!
//! ## Learning: `#[serde(default)]`
//!
//! Putting `#[serde(default)]` on a struct tells serde to fill any missing
//! field from the struct's `Default` impl, so a config file containing
//! only `[storage]` still parses into a complete `Config`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::language::Language;
use crate::workspace::FileDefaults;

const APP_NAME: &str = "codesnap";

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace defaults
    pub workspace: WorkspaceConfig,

    /// Where snapshots are kept
    pub storage: StorageConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME).join("config.toml"))
    }

    /// Saves the config to `path`.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }
}

/// Defaults applied to new and synthesized files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Name given to a freshly initialized workspace
    pub name: String,

    /// Language for unrecognized extensions and the initial preference
    pub default_language: Language,

    /// Name of the file created when the workspace would otherwise be empty
    pub welcome_file: String,
}

impl WorkspaceConfig {
    /// Returns the defaults the store uses when classifying files.
    pub fn file_defaults(&self) -> FileDefaults {
        FileDefaults {
            language: self.default_language,
            welcome_name: self.welcome_file.clone(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            name: "My Learning Workspace".to_string(),
            default_language: Language::Python,
            welcome_file: "welcome.py".to_string(),
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding snapshots (defaults to the user data dir)
    pub data_dir: Option<PathBuf>,

    /// Key the workspace snapshot is stored under
    pub key: String,
}

impl StorageConfig {
    /// Resolves the snapshot directory.
    pub fn resolve_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join(APP_NAME))
                .ok_or(ConfigError::NoDataDir),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key: "codesnap_workspace".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Data directory not found")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
