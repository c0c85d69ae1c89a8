//! verinv - Inventory package labels and versions of Windows binaries
//!
//! This tool scans directory trees for `.exe` and `.dll` files, reads the
//! version resource of each, and writes one delimited row per file.

mod marker;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use marker::RunMarker;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;
use verinv_core::{ScanConfig, Scanner, DEFAULT_KEY};

/// Default report file name, next to the executable
const DEFAULT_REPORT_NAME: &str = "version_inventory.csv";

/// Default marker file name, next to the executable
const DEFAULT_MARKER_NAME: &str = "version_inventory.lock";

/// Inventory package labels and versions of Windows executables and libraries
#[derive(Parser, Debug)]
#[command(name = "verinv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Folders to scan; when omitted, a folder is asked for interactively
    #[arg(short, long = "root-path", num_args = 1..)]
    root_path: Vec<PathBuf>,

    /// Output CSV file [default: version_inventory.csv next to the executable]
    #[arg(short, long, env = "VERINV_OUTPUT")]
    output_csv: Option<PathBuf>,

    /// CSV delimiter
    #[arg(short, long, env = "VERINV_DELIMITER", default_value = ";", value_parser = parse_delimiter)]
    delimiter: char,

    /// Version resource key used as the package label when present
    #[arg(short, long, env = "VERINV_KEY", default_value = DEFAULT_KEY)]
    key: String,

    /// Maximum number of worker threads (clamped to 1..=32)
    #[arg(short = 't', long, env = "VERINV_MAX_THREADS", value_parser = clap::value_parser!(u32).range(1..))]
    max_threads: Option<u32>,

    /// Marker file present while a scan runs [default: version_inventory.lock next to the executable]
    #[arg(long)]
    marker: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// How the roots were obtained; decides whether progress is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Roots came from the command line; only logs are emitted
    Configured,
    /// A folder was asked for on the terminal; progress and a final notice
    /// are printed
    Interactive,
}

impl RunMode {
    fn from_roots(roots: &[PathBuf]) -> Self {
        if roots.is_empty() {
            Self::Interactive
        } else {
            Self::Configured
        }
    }

    fn is_interactive(self) -> bool {
        self == Self::Interactive
    }

    /// Prints a progress line in interactive mode
    fn say(self, message: impl AsRef<str>) {
        if self.is_interactive() {
            println!("{}", message.as_ref());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let mode = RunMode::from_roots(&cli.root_path);
    let roots = match mode {
        RunMode::Configured => cli.root_path.clone(),
        RunMode::Interactive => match prompt_for_folder()? {
            Some(folder) => vec![folder],
            None => {
                println!("No folder selected. Exiting.");
                return Ok(());
            }
        },
    };

    let base_dir = executable_dir();
    let output = cli
        .output_csv
        .clone()
        .unwrap_or_else(|| base_dir.join(DEFAULT_REPORT_NAME));
    let marker_path = cli
        .marker
        .clone()
        .unwrap_or_else(|| base_dir.join(DEFAULT_MARKER_NAME));

    let marker = match RunMarker::create(&marker_path) {
        Ok(marker) => Some(marker),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    };

    let outcome = run(&cli, mode, roots, &output);

    drop(marker);
    if mode.is_interactive() {
        notify_completion();
    }
    outcome
}

/// Scans the roots and writes the report
fn run(cli: &Cli, mode: RunMode, roots: Vec<PathBuf>, output: &Path) -> Result<()> {
    let config = ScanConfig::new()
        .roots(roots)
        .key(cli.key.clone())
        .workers(cli.max_threads.map(|n| n as usize));
    let scanner = Scanner::new(config);

    let candidates = scanner.discover();
    if candidates.is_empty() {
        info!("No candidate files found");
        mode.say("No .exe or .dll files found.");
        return Ok(());
    }

    mode.say(format!(
        "Processing {} files with {} threads...",
        candidates.len(),
        scanner.worker_count()
    ));

    let scan = scanner
        .process(&candidates)
        .context("Failed to process candidate files")?;
    info!(
        "Extracted {} records from {} candidates ({} skipped, {} workers)",
        scan.records.len(),
        scan.candidates,
        scan.skipped,
        scan.workers
    );

    if scan.records.is_empty() {
        mode.say("No data exported.");
        return Ok(());
    }

    report::write_report(output, &scan.records, cli.delimiter)?;
    info!("Wrote {}", output.display());
    mode.say(format!(
        "Created: {} (rows: {})",
        output.display(),
        scan.records.len()
    ));

    Ok(())
}

/// Asks for a folder on the terminal; an empty answer means none
fn prompt_for_folder() -> Result<Option<PathBuf>> {
    print!("Folder to scan: ");
    io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read folder from terminal")?;

    let answer = line.trim();
    if answer.is_empty() {
        return Ok(None);
    }

    let folder = PathBuf::from(answer);
    if answer.starts_with(r"\\") && !folder.exists() {
        println!("Warning: the network path may not be accessible. Continuing anyway...");
    }
    Ok(Some(folder))
}

fn notify_completion() {
    println!("Run complete.");
}

/// Directory holding the running executable, or the working directory
fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Accepts exactly one character that can separate unquoted fields
fn parse_delimiter(value: &str) -> std::result::Result<char, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !matches!(c, '"' | '\r' | '\n') => Ok(c),
        (Some(_), None) => Err(format!("'{}' cannot be used as a delimiter", value.escape_debug())),
        _ => Err("delimiter must be a single character".to_string()),
    }
}
