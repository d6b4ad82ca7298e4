//! TOML-based application configuration.
//!
//! Stores:
//! - Reflection prompt cadence
//! - Database file location
//! - Motivation text sources and fallbacks
//!
//! Configuration is stored at `~/.config/habitkeep/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::reflection::ReflectionCadence;

/// Reflection cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionConfig {
    /// Streak lengths that always prompt.
    #[serde(default = "default_early_days")]
    pub early_days: Vec<u32>,
    /// Prompt on every multiple of this length; 0 disables.
    #[serde(default = "default_weekly_every")]
    pub weekly_every: u32,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file, relative to the data directory unless absolute.
    #[serde(default = "default_database")]
    pub database: String,
}

/// Motivation text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationConfig {
    /// `;`-separated file, first column is used.
    #[serde(default)]
    pub kudos_file: Option<String>,
    #[serde(default)]
    pub affirmations_file: Option<String>,
    #[serde(default = "default_fallback_kudo")]
    pub fallback_kudo: String,
    #[serde(default = "default_fallback_affirmation")]
    pub fallback_affirmation: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/habitkeep/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reflection: ReflectionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub motivation: MotivationConfig,
}

// Default functions
fn default_early_days() -> Vec<u32> {
    vec![1, 3]
}
fn default_weekly_every() -> u32 {
    7
}
fn default_database() -> String {
    "habitkeep.db".into()
}
fn default_fallback_kudo() -> String {
    "You're doing great!".into()
}
fn default_fallback_affirmation() -> String {
    "I can do this.".into()
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            early_days: default_early_days(),
            weekly_every: default_weekly_every(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for MotivationConfig {
    fn default() -> Self {
        Self {
            kudos_file: None,
            affirmations_file: None,
            fallback_kudo: default_fallback_kudo(),
            fallback_affirmation: default_fallback_affirmation(),
        }
    }
}

impl From<&ReflectionConfig> for ReflectionCadence {
    fn from(cfg: &ReflectionConfig) -> Self {
        ReflectionCadence {
            early_days: cfg.early_days.clone(),
            weekly_every: cfg.weekly_every,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|e| invalid(e.to_string()))?
                            .into(),
                    ),
                    serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Absolute path of the database file.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        let db = PathBuf::from(&self.storage.database);
        if db.is_absolute() {
            Ok(db)
        } else {
            Ok(data_dir()?.join(db))
        }
    }

    pub fn reflection_cadence(&self) -> ReflectionCadence {
        ReflectionCadence::from(&self.reflection)
    }
}
