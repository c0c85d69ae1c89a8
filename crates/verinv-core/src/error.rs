//! Error types for the verinv-core library.
//!
//! Most of these errors never reach a caller: the extraction components
//! collapse them into "metadata absent" at their boundaries. They still carry
//! enough context (paths, offsets) to be useful in trace logs.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for verinv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all verinv operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to stat input file
    #[error("failed to read metadata of '{path}': {source}")]
    FileMetadata {
        /// Path to the file whose metadata could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input is not a Portable Executable image
    #[error("not a PE image: {details}")]
    NotPortableExecutable {
        /// What check failed
        details: String,
    },

    /// The image has no resource directory
    #[error("image has no resource directory")]
    NoResourceDirectory,

    /// The resource directory has no version resource
    #[error("image has no version resource")]
    NoVersionResource,

    /// A structure is truncated or has inconsistent lengths
    #[error("malformed structure at offset {offset}: {details}")]
    Malformed {
        /// Byte offset where the problem was found
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// A version-resource query path did not resolve
    #[error("version value not found: '{query}'")]
    ValueNotFound {
        /// The query path that failed
        query: String,
    },

    /// The worker pool could not be created
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file metadata error
    pub fn file_metadata(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileMetadata {
            path: path.into(),
            source,
        }
    }

    /// Creates a new "not a PE image" error
    pub fn not_pe(details: impl Into<String>) -> Self {
        Self::NotPortableExecutable {
            details: details.into(),
        }
    }

    /// Creates a new malformed structure error
    pub fn malformed(offset: usize, details: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new value-not-found error
    pub fn value_not_found(query: impl Into<String>) -> Self {
        Self::ValueNotFound {
            query: query.into(),
        }
    }

    /// Returns true if this error only means "no version metadata here".
    ///
    /// Unreadable files count as absent too: the resource locator never
    /// reports them as failures.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::FileRead { .. }
                | Self::NotPortableExecutable { .. }
                | Self::NoResourceDirectory
                | Self::NoVersionResource
                | Self::Malformed { .. }
                | Self::ValueNotFound { .. }
        )
    }
}
