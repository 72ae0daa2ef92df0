//! Configuration file handling for ~/.featureinfo/config.ini.
//!
//! Settings structs live in [`super::settings`], parsing in
//! [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.featureinfo/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let config = super::parser::parse_ini(&ini)?;
        debug!(
            path = %path.display(),
            targets = config.targets.len(),
            "Config file loaded"
        );
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = self.to_config_string();
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Write the default configuration to `path` unless a file is already there.
    ///
    /// Returns true when a new file was written.
    pub fn ensure_exists(path: &Path) -> Result<bool, ConfigFileError> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save_to(path)?;
        debug!(path = %path.display(), "Default config file written");
        Ok(true)
    }

    /// Commented INI representation, as written by [`save_to`](Self::save_to).
    pub fn to_config_string(&self) -> String {
        super::writer::to_config_string(self)
    }
}

/// Get the path to the config directory (~/.featureinfo).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".featureinfo")
}

/// Get the path to the config file (~/.featureinfo/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::query::QueryTarget;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert!(config.dispatch.batch_by_endpoint);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_targets() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.dispatch.method = HttpMethod::Post;
        config.dispatch.timeout = 7;
        config.vendor.push(("buffer".to_string(), "5".to_string()));
        config.targets.push(
            QueryTarget::new("roads", "https://a.example.com/wms")
                .with_layers(["roads", "motorways"])
                .with_version("1.3.0")
                .with_crs("EPSG:4326")
                .with_vendor_param("MAP", "/srv/roads.map")
                .with_visibility(false),
        );
        config.targets.push(QueryTarget::new("rivers", "https://b.example.com/wms").with_layers(["rivers"]));

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.dispatch, config.dispatch);
        assert_eq!(loaded.vendor, config.vendor);
        assert_eq!(loaded.targets, config.targets);
    }

    #[test]
    fn test_ensure_exists_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fresh").join("config.ini");

        assert!(ConfigFile::ensure_exists(&config_path).unwrap());
        let written = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(written.dispatch, ConfigFile::default().dispatch);

        std::fs::write(&config_path, "[dispatch]\ntimeout = 3\n").unwrap();
        assert!(!ConfigFile::ensure_exists(&config_path).unwrap());
        assert_eq!(
            std::fs::read_to_string(&config_path).unwrap(),
            "[dispatch]\ntimeout = 3\n"
        );
    }

    #[test]
    fn test_load_reports_invalid_value() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[dispatch]\nfeature_count = lots\n").unwrap();

        let err = ConfigFile::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("dispatch.feature_count"));
    }
}
