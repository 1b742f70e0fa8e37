use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::MacroTargets;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// The linked spreadsheet, if any.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SheetConfig {
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_name: Option<String>,
}

impl SheetConfig {
    /// Sync is gated on a linked spreadsheet.
    pub fn is_linked(&self) -> bool {
        self.spreadsheet_id.is_some()
    }
}

/// Application configuration and persisted sync settings.
///
/// The source app scattered these over ad-hoc string keys; here they are
/// one typed record with a single load/save pair.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sheet: SheetConfig,
    /// Cached bearer credential from the external sign-in flow
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub targets: MacroTargets,
    pub last_synced: Option<DateTime<Utc>>,
}

/// Internal struct for the config file on disk
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    database_path: Option<PathBuf>,
    sheet: SheetConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    targets: MacroTargets,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_synced: Option<DateTime<Utc>>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default_db_path = Self::default_data_dir().join("meals.db");

        let mut database_path = ConfigValue::new(default_db_path, ConfigSource::Default);
        let mut config_file = None;
        let mut sheet = SheetConfig::default();
        let mut access_token = None;
        let mut targets = MacroTargets::default();
        let mut last_synced = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            sheet = file_config.sheet;
            access_token = file_config.access_token;
            targets = file_config.targets;
            last_synced = file_config.last_synced;
        }

        if let Ok(db_path) = std::env::var("MEALLOG_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(token) = std::env::var("MEALLOG_ACCESS_TOKEN") {
            access_token = Some(token);
        }

        Ok(Self {
            database_path,
            config_file,
            sheet,
            access_token,
            targets,
            last_synced,
        })
    }

    /// Writes current settings back to the config file.
    ///
    /// Values that came from the environment are not persisted; the
    /// database path is only written if the file set it in the first place.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = self
            .config_file
            .clone()
            .unwrap_or_else(Self::default_config_path);

        let file_config = ConfigFile {
            database_path: match self.database_path.source {
                ConfigSource::File => Some(self.database_path.value.clone()),
                _ => None,
            },
            sheet: self.sheet.clone(),
            access_token: self.access_token.clone(),
            targets: self.targets,
            last_synced: self.last_synced,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(path.clone(), e))?;
        }
        let contents = serde_yaml::to_string(&file_config)
            .map_err(|e| ConfigError::SerializeError(path.clone(), e))?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::WriteError(path.clone(), e))?;

        Ok(path)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/meallog/
    /// - macOS: ~/Library/Application Support/meallog/
    /// - Windows: %APPDATA%/meallog/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meallog")
    }

    /// Default data directory (platform-specific)
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meallog")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    WriteError(PathBuf, std::io::Error),
    SerializeError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::WriteError(path, e) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), e)
            }
            ConfigError::SerializeError(path, e) => {
                write!(
                    f,
                    "Failed to serialize config file '{}': {}",
                    path.display(),
                    e
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
