//! Concurrent scan pipeline.
//!
//! ## Algorithm Overview
//!
//! 1. Canonicalize each root; skip roots that do not resolve
//! 2. Walk every root, keeping files whose extension is in the configured
//!    set (case-insensitive), deduplicated by path
//! 3. Size a fixed worker pool: `clamp(2 × logical CPUs, 1, 32)`, or the
//!    explicit override clamped to the same bounds
//! 4. Spawn one extraction task per candidate; collect records as tasks
//!    complete
//!
//! Output order is completion order. Paths are unique, so consumers that
//! need a stable order sort afterwards.
//!
//! ## Example
//!
//! ```no_run
//! use verinv_core::{ScanConfig, Scanner};
//!
//! let config = ScanConfig::new().root("C:\\Program Files").key("Package");
//! let report = Scanner::new(config).run()?;
//! for record in &report.records {
//!     println!("{} -> {}", record.path.display(), record.package);
//! }
//! # Ok::<(), verinv_core::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::extract::{Extractor, FileRecord, DEFAULT_KEY};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Extensions of executables and libraries
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["exe", "dll"];

/// Lower bound of the worker pool
pub const MIN_WORKERS: usize = 1;

/// Upper bound of the worker pool
pub const MAX_WORKERS: usize = 32;

/// Configuration for a scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directories (or files) to scan
    pub roots: Vec<PathBuf>,
    /// Requested metadata key
    pub key: String,
    /// Worker count override, clamped to `[MIN_WORKERS, MAX_WORKERS]`
    pub workers: Option<usize>,
    /// File extensions to collect, without the dot
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            key: DEFAULT_KEY.to_string(),
            workers: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    /// Creates a new scan config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Adds several roots
    pub fn roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Sets the requested metadata key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the worker count override
    pub fn workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Replaces the collected extensions
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Computes the worker count for `logical_cpus` processors.
pub fn worker_count(explicit: Option<usize>, logical_cpus: usize) -> usize {
    explicit
        .unwrap_or_else(|| logical_cpus.saturating_mul(2))
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Unique candidate paths in discovery order
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl CandidateSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a path; returns false if it was already present
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    /// Returns true if `path` is in the set
    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if there are no candidates
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates over candidates in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Records in completion order
    pub records: Vec<FileRecord>,
    /// Number of candidate files
    pub candidates: usize,
    /// Candidates that produced no record
    pub skipped: usize,
    /// Size of the worker pool used
    pub workers: usize,
}

/// Discovers candidate files and extracts their records in parallel
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    extractor: Extractor,
}

impl Scanner {
    /// Creates a scanner with the default field chain
    pub fn new(config: ScanConfig) -> Self {
        let extractor = Extractor::new(config.key.clone());
        Self { config, extractor }
    }

    /// Creates a scanner with a custom extractor.
    ///
    /// The extractor's key takes precedence over `config.key`.
    pub fn with_extractor(config: ScanConfig, extractor: Extractor) -> Self {
        Self { config, extractor }
    }

    /// Returns the configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Worker count for this machine and configuration
    pub fn worker_count(&self) -> usize {
        worker_count(self.config.workers, num_cpus::get())
    }

    /// Walks all roots and collects candidate files.
    ///
    /// Roots that do not exist are skipped; entries that fail during the
    /// walk are skipped without affecting the rest of the root.
    pub fn discover(&self) -> CandidateSet {
        let mut candidates = CandidateSet::new();

        for root in &self.config.roots {
            let resolved = match std::fs::canonicalize(root) {
                Ok(path) => simplify(path),
                Err(e) => {
                    debug!("Skipping root {}: {}", root.display(), e);
                    continue;
                }
            };

            let before = candidates.len();
            for entry in WalkDir::new(&resolved).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Error walking {}: {}", resolved.display(), e);
                        continue;
                    }
                };
                if entry.file_type().is_file()
                    && has_extension(entry.path(), &self.config.extensions)
                {
                    let path = entry.into_path();
                    if !candidates.insert(path.clone()) {
                        trace!("Already collected: {}", path.display());
                    }
                }
            }
            debug!(
                "Root {}: {} new candidates",
                resolved.display(),
                candidates.len() - before
            );
        }

        candidates
    }

    /// Extracts records for `candidates` on a fixed-size worker pool.
    pub fn process(&self, candidates: &CandidateSet) -> Result<ScanReport> {
        let workers = self.worker_count();
        if candidates.is_empty() {
            return Ok(ScanReport {
                workers,
                ..ScanReport::default()
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("verinv-worker-{}", i))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        debug!(
            "Processing {} candidates with {} workers",
            candidates.len(),
            workers
        );

        let (tx, rx) = crossbeam_channel::unbounded();
        let extractor = &self.extractor;
        pool.scope(|scope| {
            for path in candidates.iter() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    // The receiver outlives the scope
                    let _ = tx.send(extractor.extract(path));
                });
            }
        });
        drop(tx);

        let records: Vec<FileRecord> = rx.into_iter().flatten().collect();
        let skipped = candidates.len() - records.len();
        debug!(
            "Scan complete: {} records, {} skipped",
            records.len(),
            skipped
        );

        Ok(ScanReport {
            records,
            candidates: candidates.len(),
            skipped,
            workers,
        })
    }

    /// Discovers and processes in one call
    pub fn run(&self) -> Result<ScanReport> {
        let candidates = self.discover();
        self.process(&candidates)
    }
}

/// Case-insensitive extension match
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Drops the `\\?\` prefix `canonicalize` adds on Windows, so reported paths
/// look like the ones users type.
fn simplify(path: PathBuf) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{}", rest));
    }
    match text.strip_prefix(r"\\?\") {
        Some(rest) if rest.as_bytes().get(1) == Some(&b':') => PathBuf::from(rest),
        _ => path,
    }
}
