//! CLI argument definitions for hrrr-sampler.

use clap::{Parser, ValueEnum};
use hrrr_sampler::Config;
use std::path::PathBuf;

/// Random HRRR GRIB2 sampling and validation.
///
/// Picks random files from recent days of the public HRRR archive,
/// downloads them, and runs each through the Go integration test that
/// compares the decoder against wgrib2.
///
/// ## Examples
///
/// Test five random files with no size limit:
///   hrrr-sampler
///
/// Test ten files up to 100 MB each and keep them afterwards:
///   hrrr-sampler -n 10 --max-size 100 --keep-files
///
/// Reproduce an earlier selection:
///   hrrr-sampler --seed 42 --json-report run.json
#[derive(Parser, Debug)]
#[command(name = "hrrr-sampler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Run Options ===
    /// Number of random files to test
    #[arg(short = 'n', long, env = "HRRR_NUM_FILES", value_parser = parse_positive_usize)]
    pub num_files: Option<usize>,

    /// Maximum file size in MB (default: no limit)
    #[arg(long, env = "HRRR_MAX_SIZE", value_parser = parse_positive_mb)]
    pub max_size: Option<f64>,

    /// Keep downloaded files after testing
    #[arg(long)]
    pub keep_files: bool,

    /// Show detailed output from tests
    #[arg(short, long)]
    pub verbose: bool,

    /// Seed for date and file shuffling
    #[arg(long, env = "HRRR_SEED")]
    pub seed: Option<u64>,

    /// Directory under which the run directory is created
    #[arg(long, env = "HRRR_OUTPUT_ROOT")]
    pub output_root: Option<PathBuf>,

    // === Discovery Options ===
    /// Files requested from each date
    #[arg(long, value_parser = parse_positive_usize)]
    pub per_date: Option<usize>,

    /// Maximum number of dates to search
    #[arg(long, value_parser = parse_positive_usize)]
    pub max_dates: Option<usize>,

    /// Size of the trailing date window in days
    #[arg(long)]
    pub days_back: Option<u32>,

    // === Configuration and Output ===
    /// TOML configuration file
    #[arg(short, long, env = "HRRR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub json_report: Option<PathBuf>,

    /// Disable colored console output (also honored: a non-empty NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    // === Logging Options ===
    /// Log level for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(n) = self.num_files {
            config.run.num_files = n;
        }
        if let Some(mb) = self.max_size {
            config.run.max_size_mb = Some(mb);
        }
        if self.keep_files {
            config.run.keep_files = true;
        }
        if self.verbose {
            config.run.verbose = true;
        }
        if let Some(seed) = self.seed {
            config.run.seed = Some(seed);
        }
        if let Some(root) = &self.output_root {
            config.run.output_root = root.clone();
        }
        if let Some(quota) = self.per_date {
            config.discovery.per_date_quota = quota;
        }
        if let Some(max) = self.max_dates {
            config.discovery.max_dates = max;
        }
        if let Some(days) = self.days_back {
            config.discovery.days_back = days;
        }
    }
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level (default)
    Warn,
    /// Error level (least verbose)
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}

/// Parse a positive, finite size in megabytes.
fn parse_positive_mb(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid size in MB", s))?;
    if !(value.is_finite() && value > 0.0) {
        return Err("size must be a positive number of megabytes".to_string());
    }
    Ok(value)
}
