//! File-backed logging. The terminal belongs to the TUI, so records are
//! appended to a log file next to the database instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

const LOG_FILE_NAME: &str = "customer-scheduler.log";

/// Install the global logger writing to `<dir>/customer-scheduler.log`.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).context("failed to create log directory")?;
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()
        .context("failed to install logger")?;

    log::info!("logging to {}", path.display());
    Ok(path)
}
