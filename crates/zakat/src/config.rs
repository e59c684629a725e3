//! Configuration management for zakat.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "zakat";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "zakat.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ZAKAT_`)
/// 2. TOML config file at `~/.config/zakat/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Export and backup configuration.
    pub export: ExportConfig,
    /// Input limits.
    pub limits: LimitsConfig,
}

/// Database-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/zakat/zakat.db`
    pub path: Option<PathBuf>,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory that receives spreadsheet reports, CSV files, and backups.
    pub output_dir: PathBuf,
}

/// Upper bounds on numeric input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted rice price per kilogram.
    pub max_price_per_kg: f64,
    /// Largest accepted distribution quantity in kilograms.
    pub max_quantity_kg: f64,
    /// Largest accepted donation amount.
    pub max_amount: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_price_per_kg: 1_000_000.0,
            max_quantity_kg: 100_000.0,
            max_amount: 1_000_000_000.0,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ZAKAT_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("max_price_per_kg", self.limits.max_price_per_kg),
            ("max_quantity_kg", self.limits.max_quantity_kg),
            ("max_amount", self.limits.max_amount),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ConfigValidation {
                    message: format!("limits.{name} must be a positive number, got {value}"),
                });
            }
        }

        if self.export.output_dir.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "export.output_dir cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = LimitsConfig::default();

        assert!((limits.max_price_per_kg - 1_000_000.0).abs() < f64::EPSILON);
        assert!((limits.max_quantity_kg - 100_000.0).abs() < f64::EPSILON);
        assert!(limits.max_amount > limits.max_price_per_kg);
    }

    #[test]
    fn test_default_export_dir() {
        assert_eq!(ExportConfig::default().output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = Config::default();
        config.limits.max_quantity_kg = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_quantity_kg"));
    }

    #[test]
    fn test_validate_nan_limit() {
        let mut config = Config::default();
        config.limits.max_price_per_kg = f64::NAN;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_price_per_kg"));
    }

    #[test]
    fn test_validate_empty_output_dir() {
        let mut config = Config::default();
        config.export.output_dir = PathBuf::new();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("zakat.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.database.path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("zakat"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[database]\npath = \"/data/zakat.db\"\n\n[limits]\nmax_price_per_kg = 500.0\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/data/zakat.db"));
        assert!((config.limits.max_price_per_kg - 500.0).abs() < f64::EPSILON);
        assert!((config.limits.max_quantity_kg - 100_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_rejects_invalid_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[limits]\nmax_amount = -1.0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_limits_deserialize_partial() {
        let json = r#"{"max_quantity_kg": 250.0}"#;
        let limits: LimitsConfig = serde_json::from_str(json).unwrap();
        assert!((limits.max_quantity_kg - 250.0).abs() < f64::EPSILON);
        assert!((limits.max_price_per_kg - 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("max_price_per_kg"));
        assert!(json.contains("output_dir"));
    }
}
