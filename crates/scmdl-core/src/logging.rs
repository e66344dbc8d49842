//! Logging init: file under the XDG state dir, or stderr when that is not writable.
//!
//! User-facing progress lines are printed by the CLI; this log carries the
//! per-item details (URLs, exit codes, byte counts) for later inspection.

use anyhow::Result;
use std::fmt;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,scmdl=debug,scmdl_core=debug";

/// Where log records ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// Path of the log file: `~/.local/state/scmdl/scmdl.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("scmdl")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir.join("scmdl.log"))
}

impl fmt::Display for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::File(path) => write!(f, "{}", path.display()),
            LogSink::Stderr => f.write_str("stderr"),
        }
    }
}

fn open_log_file() -> Result<(File, PathBuf)> {
    let path = log_file_path()?;
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn install<W>(writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

/// Install the global subscriber, appending to the state-dir log file and
/// falling back to stderr if the file cannot be opened.
pub fn init() -> LogSink {
    match open_log_file() {
        Ok((file, path)) => {
            install(Mutex::new(file));
            tracing::info!("scmdl logging initialized at {}", path.display());
            LogSink::File(path)
        }
        Err(err) => {
            install(std::io::stderr);
            tracing::warn!("log file unavailable ({err:#}), logging to stderr");
            LogSink::Stderr
        }
    }
}
