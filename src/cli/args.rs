//! Command line argument parsing for the skills-utils CLI using clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// skills-utils - quarters, object storage and JSON-lines helpers for the skills pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "skills-utils")]
#[command(about = "Quarter, object storage and JSON-lines helpers for the skills pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SkillsArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Root directory of the object store used by upload, download and list
    #[arg(long, env = "SKILLS_UTILS_STORE_ROOT", default_value = ".skills-store")]
    pub store_root: PathBuf,

    /// Create buckets on first write instead of failing
    #[arg(long)]
    pub create_buckets: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SkillsArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the first and last day of a quarter
    Quarter(QuarterArgs),

    /// Show the quarter a date falls in
    #[command(name = "quarter-of")]
    QuarterOf(QuarterOfArgs),

    /// List every date in a range (end exclusive)
    Dates(DatesArgs),

    /// Upload a local file under an s3 path prefix
    Upload(UploadArgs),

    /// Download an object to a local file
    Download(DownloadArgs),

    /// List the files under an s3 path prefix
    List(ListArgs),

    /// Count the records of a JSON-lines file, reporting skipped lines
    #[command(name = "check-jsonl")]
    CheckJsonl(CheckJsonlArgs),
}

/// Arguments for the quarter command
#[derive(Parser, Debug, Clone)]
pub struct QuarterArgs {
    /// Quarter in the form 2015Q1
    #[arg(value_name = "QUARTER")]
    pub quarter: String,
}

/// Arguments for the quarter-of command
#[derive(Parser, Debug, Clone)]
pub struct QuarterOfArgs {
    /// Date in the form 2015-02-14
    #[arg(value_name = "DATE")]
    pub date: NaiveDate,
}

/// Arguments for the dates command
#[derive(Parser, Debug, Clone)]
pub struct DatesArgs {
    /// First date (inclusive)
    #[arg(value_name = "START")]
    pub start: NaiveDate,

    /// Last date (exclusive)
    #[arg(value_name = "END")]
    pub end: NaiveDate,
}

/// Arguments for uploading a file
#[derive(Parser, Debug, Clone)]
pub struct UploadArgs {
    /// Local file to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Destination prefix, e.g. bucket/path
    #[arg(value_name = "S3_PATH")]
    pub s3_path: String,
}

/// Arguments for downloading an object
#[derive(Parser, Debug, Clone)]
pub struct DownloadArgs {
    /// Object to download, e.g. bucket/path/key
    #[arg(value_name = "S3_PATH")]
    pub s3_path: String,

    /// Local file to write
    #[arg(value_name = "OUT")]
    pub out: PathBuf,
}

/// Arguments for listing files
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Prefix to list, e.g. bucket/path/
    #[arg(value_name = "S3_PATH")]
    pub s3_path: String,
}

/// Arguments for checking a JSON-lines file
#[derive(Parser, Debug, Clone)]
pub struct CheckJsonlArgs {
    /// JSON-lines file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Records per batch
    #[arg(short, long, default_value = "500")]
    pub batch_size: usize,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
