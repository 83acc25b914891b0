//! Error types for hrrr-sampler
//!
//! Only run-level (fatal) conditions are represented here. Per-item problems
//! such as a listing timeout for one date, a failed transfer, or a failing
//! validation are soft failures: they are carried as [`ToolOutcome`] values and
//! recorded in the run report, never raised as an [`Error`].
//!
//! [`ToolOutcome`]: crate::process::ToolOutcome

use thiserror::Error;

/// Result type alias for hrrr-sampler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit status for a successful run
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status for any ordinary failure category
pub const EXIT_FAILURE: i32 = 1;
/// Process exit status when the operator interrupts the run
pub const EXIT_INTERRUPTED: i32 = 130;

/// Main error type for hrrr-sampler
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "run.num_files")
        key: Option<String>,
    },

    /// I/O error (working directory creation, report writing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration file: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Report serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// One or more required external tools are not installed
    #[error("missing dependencies: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    /// Discovery ended without a single eligible file
    #[error("no GRIB2 files found after trying {dates_tried} date(s)")]
    NoCandidates {
        /// Number of distinct dates queried before giving up
        dates_tried: usize,
    },

    /// Every selected candidate failed to download
    #[error("no files were successfully downloaded ({attempted} attempted)")]
    NoDownloads {
        /// Number of transfers attempted
        attempted: usize,
    },

    /// The operator cancelled the run
    #[error("interrupted by user")]
    Interrupted,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Process exit status this error maps to
    ///
    /// Interruption has its own status; every other category is a generic
    /// failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}
