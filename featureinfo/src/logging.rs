//! Logging infrastructure for FeatureInfo.
//!
//! Provides structured logging with file output and console output:
//! - Writes to the configured log file (cleared on session start)
//! - Optionally mirrors to stderr so command output on stdout stays clean
//! - Configurable via RUST_LOG environment variable

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "featureinfo.log"
}

/// Filter directive used when RUST_LOG is unset.
fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Build the env filter.
///
/// `debug` wins over RUST_LOG; otherwise RUST_LOG is honoured and falls back
/// to `info`.
fn build_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new(default_directive(true));
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(false)))
}

/// Create the log directory and truncate the log file.
///
/// Returns the directory and file name the appender writes to.
fn prepare_log_file(log_path: &Path) -> Result<(PathBuf, OsString), io::Error> {
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let log_file = log_path
        .file_name()
        .map(|f| f.to_os_string())
        .unwrap_or_else(|| default_log_file().into());

    fs::create_dir_all(&log_dir)?;
    fs::write(log_dir.join(&log_file), "")?;

    Ok((log_dir, log_file))
}

/// Initialize logging system.
///
/// Creates the log directory if needed, clears the previous log file, and
/// installs the global subscriber.
///
/// # Arguments
///
/// * `log_path` - Log file path (e.g., "~/.featureinfo/featureinfo.log")
/// * `console` - Also write log lines to stderr
/// * `debug` - Force debug level regardless of RUST_LOG
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file
/// cannot be cleared
pub fn init_logging(log_path: &Path, console: bool, debug: bool) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = prepare_log_file(log_path)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(build_filter(debug))
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
