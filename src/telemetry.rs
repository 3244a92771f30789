//! Logging setup
//!
//! The TUI owns the terminal, so in TUI mode logs go to `flixtui.log` in the
//! data directory. CLI runs log to stderr and keep stdout for output.

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file name inside the data directory
pub const LOG_FILE: &str = "flixtui.log";

/// Where log lines are written
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Log file target inside `data_dir`
    pub fn file_in(data_dir: &Path) -> Self {
        LogTarget::File(data_dir.join(LOG_FILE))
    }
}

/// `RUST_LOG` if set, otherwise `level`
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber
pub fn init(level: &str, target: &LogTarget) -> Result<()> {
    match target {
        LogTarget::Stderr => fmt()
            .with_env_filter(build_env_filter(level))
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {err}")),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            fmt()
                .with_env_filter(build_env_filter(level))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
        }
    }
}
