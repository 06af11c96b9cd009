//! Configuration management for photojournal.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::camera::{FacingMode, StreamConstraints};
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "photojournal";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "journal.db";

/// Default remote quote endpoint.
pub const DEFAULT_QUOTE_ENDPOINT: &str =
    "https://api.quotable.io/random?tags=inspirational|wisdom|life";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PHOTOJOURNAL_`)
/// 2. TOML config file at `~/.config/photojournal/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Quote service configuration.
    pub quotes: QuoteConfig,
    /// Camera configuration.
    pub camera: CameraConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/photojournal/journal.db`
    pub database_path: Option<PathBuf>,
}

/// Quote service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// URL returning `{"content": ..., "author": ...}`.
    pub endpoint: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Camera configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Preferred stream width; the device may deliver less.
    pub preferred_width: u32,
    /// Preferred stream height; the device may deliver less.
    pub preferred_height: u32,
    /// Which camera to ask for.
    pub facing: FacingMode,
    /// JPEG quality for captured stills, 1-100.
    pub jpeg_quality: u8,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_QUOTE_ENDPOINT.to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            preferred_width: 1920,
            preferred_height: 1080,
            facing: FacingMode::Environment,
            jpeg_quality: 90,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

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
            .merge(Env::prefixed("PHOTOJOURNAL_").split("__"));

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
        if self.quotes.timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "quotes.timeout_ms must be greater than 0".to_string(),
            });
        }

        if let Err(e) = reqwest::Url::parse(&self.quotes.endpoint) {
            return Err(Error::ConfigValidation {
                message: format!("invalid quotes.endpoint {}: {e}", self.quotes.endpoint),
            });
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "camera.jpeg_quality must be between 1 and 100, got {}",
                    self.camera.jpeg_quality
                ),
            });
        }

        if self.camera.preferred_width == 0 || self.camera.preferred_height == 0 {
            return Err(Error::ConfigValidation {
                message: "camera preferred dimensions must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the quote timeout as a Duration.
    #[must_use]
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quotes.timeout_ms)
    }

    /// Stream constraints to request from the camera.
    #[must_use]
    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: self.camera.facing,
            ideal_width: self.camera.preferred_width,
            ideal_height: self.camera.preferred_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.quotes.endpoint, DEFAULT_QUOTE_ENDPOINT);
        assert_eq!(config.quotes.timeout_ms, 5_000);
        assert_eq!(config.camera.preferred_width, 1920);
        assert_eq!(config.camera.preferred_height, 1080);
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.camera.jpeg_quality, 90);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.quotes.timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_ms"));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.quotes.endpoint = "not a url".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("quotes.endpoint"));
    }

    #[test]
    fn test_validate_jpeg_quality_bounds() {
        let mut config = Config::default();
        config.camera.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.camera.jpeg_quality = 101;
        assert!(config.validate().is_err());

        config.camera.jpeg_quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_dimensions() {
        let mut config = Config::default();
        config.camera.preferred_height = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("dimensions"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("journal.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/journal.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/journal.sqlite")
        );
    }

    #[test]
    fn test_quote_timeout() {
        assert_eq!(Config::default().quote_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_stream_constraints() {
        let constraints = Config::default().stream_constraints();
        assert_eq!(constraints.ideal_width, 1920);
        assert_eq!(constraints.ideal_height, 1080);
        assert_eq!(constraints.facing, FacingMode::Environment);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("photojournal"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[quotes]\ntimeout_ms = 2500\n\n[camera]\njpeg_quality = 75\nfacing = \"user\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.quotes.timeout_ms, 2500);
        assert_eq!(config.camera.jpeg_quality, 75);
        assert_eq!(config.camera.facing, FacingMode::User);
        assert_eq!(config.camera.preferred_width, 1920);
    }

    #[test]
    fn test_toml_file_overrides_single_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[quotes]\ntimeout_ms = 2500\n").unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.quote_timeout(), Duration::from_millis(2500));
        assert_eq!(config.quotes.endpoint, DEFAULT_QUOTE_ENDPOINT);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[camera]\njpeg_quality = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_quote_config_deserialize() {
        let json = r#"{"endpoint": "http://localhost:9000/q"}"#;
        let quotes: QuoteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(quotes.endpoint, "http://localhost:9000/q");
        assert_eq!(quotes.timeout_ms, 5_000);
    }
}
