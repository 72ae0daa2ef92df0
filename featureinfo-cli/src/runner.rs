//! CLI runner for common setup.
//!
//! Loads the configuration and initializes logging so command handlers
//! start from the same state.

use std::path::{Path, PathBuf};

use featureinfo::config::{config_file_path, ConfigFile};
use featureinfo::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Where the configuration was read from
    config_path: PathBuf,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to read; the default location when `None`
    /// * `debug_mode` - When true, enables debug-level logging to stderr
    ///   regardless of RUST_LOG
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        let config_path = resolve_config_path(config_path);

        let logging_guard = init_logging(&config.logging.file, debug_mode, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("FeatureInfo v{}", featureinfo::VERSION);
        info!(
            config = %self.config_path.display(),
            targets = self.config.targets.len(),
            "FeatureInfo CLI: {} command",
            command
        );
    }
}

/// Explicit path if given, else ~/.featureinfo/config.ini.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}
