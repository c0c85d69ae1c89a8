//! # verinv-core
//!
//! A library for inventorying Windows executables and libraries by the
//! metadata embedded in their version resources.
//!
//! This crate provides the core functionality for:
//! - Locating the version resource inside a PE image
//! - Reading its translation table, string tables and fixed version record
//! - Deriving a package label through an ordered fallback chain
//! - Scanning directory trees and extracting records on a worker pool
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`resource`]: PE parsing and version resource location
//! - [`version`]: Version resource interpretation and the label policy
//! - [`extract`]: Per-file record extraction
//! - [`scanner`]: File discovery and the concurrent pipeline
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use verinv_core::{resource, version::FieldChain};
//! use std::path::Path;
//!
//! let path = Path::new("C:\\Windows\\notepad.exe");
//! let block = resource::locate(path);
//! let label = FieldChain::new().package_label(block.as_ref(), "Package", path);
//! println!("{}", label);
//! ```
//!
//! ## Extensibility
//!
//! - [`FieldSource`]: Add another way of looking up string fields
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod extract;
pub mod resource;
pub mod scanner;
pub mod version;

mod le;
#[cfg(test)]
mod testutil;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use extract::{Extractor, FileRecord, DEFAULT_KEY, TIMESTAMP_FORMAT};
pub use resource::{locate, ResourceBlock};
pub use scanner::{worker_count, CandidateSet, ScanConfig, ScanReport, Scanner};
pub use version::{FieldChain, FieldResolver, FieldSource, FixedVersion, PackageLabel, VersionVariant};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
