//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::Path;

use clap::Subcommand;
use featureinfo::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration, defaults included
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
///
/// These commands don't initialize logging; they only touch the config file.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = ConfigFile::load_from(&path)?;
            print!("{}", config.to_config_string());
            Ok(())
        }
        ConfigCommands::Init => run_init(&path),
    }
}

fn run_init(path: &Path) -> Result<(), CliError> {
    if ConfigFile::ensure_exists(path)? {
        println!("Wrote default configuration to {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        run_init(&path).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "[dispatch]\ntimeout = 3\n").unwrap();
        run_init(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[dispatch]\ntimeout = 3\n"
        );
    }

    #[test]
    fn test_show_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[view]\nwidth = wide\n").unwrap();

        let err = run(ConfigCommands::Show, Some(path.as_path())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
