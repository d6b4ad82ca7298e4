mod config;
mod memory;
pub mod migrations;
mod sqlite;
mod traits;

pub use config::{Config, MotivationConfig, ReflectionConfig, StorageConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DailyMarkStore, HabitStore, StreakStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the habitkeep data directory, creating it if needed.
///
/// `HABITKEEP_DATA_DIR` wins when set. Otherwise `~/.config/habitkeep[-dev]/`
/// based on HABITKEEP_ENV; set HABITKEEP_ENV=dev to use the development
/// data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HABITKEEP_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITKEEP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitkeep-dev")
            } else {
                base_dir.join("habitkeep")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
