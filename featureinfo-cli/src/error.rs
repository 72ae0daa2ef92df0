//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use featureinfo::catalog::CatalogError;
use featureinfo::config::ConfigFileError;
use featureinfo::http::HttpError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Layer selection error
    Catalog(CatalogError),
    /// Failed to create the HTTP client
    Http(HttpError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// The query ended without a result
    Query(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Catalog(CatalogError::UnknownTarget(_)) => {
                eprintln!();
                eprintln!("Use 'featureinfo targets' to list the configured layers.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Use 'featureinfo config path' to locate the configuration file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Catalog(e) => write!(f, "Layer selection failed: {}", e),
            CliError::Http(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Query(msg) => write!(f, "Query failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Catalog(e) => Some(e),
            CliError::Http(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        CliError::Catalog(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::Http(e)
    }
}
