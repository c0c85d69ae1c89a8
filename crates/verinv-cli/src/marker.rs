//! Advisory marker file signalling that a scan is running.
//!
//! The marker holds four lines: process id, start time, host and user. It is
//! removed when the [`RunMarker`] guard drops, whatever the outcome of the
//! run. Nothing reads it for mutual exclusion.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};
use verinv_core::TIMESTAMP_FORMAT;

const UNKNOWN: &str = "Unknown";

/// Contents of a marker file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerInfo {
    /// Process id
    pub pid: u32,
    /// Local start time
    pub started: String,
    /// Host name
    pub host: String,
    /// User name
    pub user: String,
}

impl MarkerInfo {
    /// Describes the current process
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            started: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            host: env_or_unknown(&["COMPUTERNAME", "HOSTNAME"]),
            user: env_or_unknown(&["USERNAME", "USER"]),
        }
    }

    /// One value per line
    pub fn render(&self) -> String {
        format!("{}\n{}\n{}\n{}\n", self.pid, self.started, self.host, self.user)
    }
}

fn env_or_unknown(keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Creates the marker on construction and removes it on drop
#[derive(Debug)]
pub struct RunMarker {
    path: PathBuf,
}

impl RunMarker {
    /// Writes the marker for the current process
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::write(&path, MarkerInfo::current().render())
            .with_context(|| format!("Failed to create marker file: {}", path.display()))?;
        debug!("Created marker {}", path.display());
        Ok(Self { path })
    }

    /// Location of the marker
    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for RunMarker {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed marker {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove marker {}: {}", self.path.display(), e),
        }
    }
}
