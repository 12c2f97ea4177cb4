// ⚙️ Configuration - file locations and log level
//
// Values come from `PETS_*` environment variables with defaults; the CLI
// may override each one with a flag.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "exotic_pets.db";
pub const DEFAULT_SNAPSHOT_PATH: &str = "estado_mascotas_random.dat";
pub const DEFAULT_EXPORT_PATH: &str = "mascotas_idpyba.ser";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Snapshot written on `snapshot` and read on `restore`
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Target of the filtered (no feed type) export
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}

fn default_export_path() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_PATH)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: default_db_path(),
            snapshot_path: default_snapshot_path(),
            export_path: default_export_path(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `PETS_DB_PATH`, `PETS_SNAPSHOT_PATH`,
    /// `PETS_EXPORT_PATH` and `PETS_LOG_LEVEL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        AppConfig {
            db_path: lookup("PETS_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            snapshot_path: lookup("PETS_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            export_path: lookup("PETS_EXPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_path),
            log_level: lookup("PETS_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("db_path", &self.db_path),
            ("snapshot_path", &self.snapshot_path),
            ("export_path", &self.export_path),
        ] {
            if path.as_os_str().is_empty() {
                bail!("{} must not be empty", name);
            }
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!(
                "log level '{}' is not supported. Supported levels: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None);

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.snapshot_path, PathBuf::from("estado_mascotas_random.dat"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> =
            [("PETS_DB_PATH", "/tmp/pets.db"), ("PETS_LOG_LEVEL", "DEBUG")].into_iter().collect();

        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.db_path, PathBuf::from("/tmp/pets.db"));
        assert_eq!(config.export_path, PathBuf::from(DEFAULT_EXPORT_PATH));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.db_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AppConfig = serde_json::from_str(r#"{"db_path": "other.db"}"#).unwrap();

        assert_eq!(config.db_path, PathBuf::from("other.db"));
        assert_eq!(config.log_level, "info");
    }
}
