//! FeatureInfo CLI - Command-line interface
//!
//! Queries the layers described in `~/.featureinfo/config.ini` with WMS
//! GetFeatureInfo requests and prints the aggregated answer.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::query::QueryArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "featureinfo")]
#[command(version, about = "Query WMS layers at a map pixel with GetFeatureInfo", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.featureinfo/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query layers at a pixel position
    Query(QueryArgs),

    /// List the configured layers
    Targets,

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Query(args) => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            commands::query::run(args, &runner)
        }
        Commands::Targets => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            commands::targets::run(&runner)
        }
        Commands::Config(command) => commands::config::run(command, cli.config.as_deref()),
    }
}
