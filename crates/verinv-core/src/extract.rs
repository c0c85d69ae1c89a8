//! Per-file extraction.
//!
//! An [`Extractor`] turns one path into one [`FileRecord`]. Files that cannot
//! be stat'd produce no record; files without usable version metadata still
//! produce one, labelled through the fallback chain.

use crate::error::{Error, Result};
use crate::resource;
use crate::version::{FieldChain, PackageLabel};
use chrono::{DateTime, Local};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Key requested when none is configured
pub const DEFAULT_KEY: &str = "Package";

/// Timestamp layout of [`FileRecord::modified_display`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Full path of the file
    pub path: PathBuf,
    /// Package label
    pub package: PackageLabel,
    /// Last modification time, local time zone
    pub modified: DateTime<Local>,
    /// Size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Modification time as `YYYY-MM-DD HH:MM:SS`
    pub fn modified_display(&self) -> String {
        self.modified.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Extracts [`FileRecord`]s for a fixed requested key
#[derive(Debug)]
pub struct Extractor {
    key: String,
    chain: FieldChain,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_KEY)
    }
}

impl Extractor {
    /// Creates an extractor with the default field chain
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_chain(key, FieldChain::new())
    }

    /// Creates an extractor with a custom field chain
    pub fn with_chain(key: impl Into<String>, chain: FieldChain) -> Self {
        Self {
            key: key.into(),
            chain,
        }
    }

    /// The requested key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Builds the record for `path`.
    ///
    /// Only a failed stat is an error; missing metadata is handled by the
    /// fallback chain.
    pub fn try_extract(&self, path: &Path) -> Result<FileRecord> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::file_metadata(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| Error::file_metadata(path, e))?;

        let block = resource::locate(path);
        let package = self.chain.package_label(block.as_ref(), &self.key, path);

        Ok(FileRecord {
            path: path.to_path_buf(),
            package,
            modified: DateTime::<Local>::from(modified),
            size: metadata.len(),
        })
    }

    /// Builds the record for `path`, or `None` on any failure.
    ///
    /// Panics raised while parsing are caught here so one file cannot take
    /// down a worker pool.
    pub fn extract(&self, path: &Path) -> Option<FileRecord> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_extract(path))) {
            Ok(Ok(record)) => Some(record),
            Ok(Err(e)) => {
                trace!("Skipping {}: {}", path.display(), e);
                None
            }
            Err(_) => {
                trace!("Skipping {}: extraction panicked", path.display());
                None
            }
        }
    }
}
