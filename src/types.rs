//! Core types shared by the discovery, acquisition and validation stages

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Calendar date key used to address one day of the archive (`YYYYMMDD`)
///
/// Keys sort chronologically because the format is fixed-width.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    /// Format used for keys and archive folder names
    pub const FORMAT: &'static str = "%Y%m%d";

    /// Key for a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(Self::FORMAT).to_string())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote object that passed the name and size filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Full remote URL (e.g. `gs://bucket/hrrr.20240101/conus/hrrr.t00z.wrfnatf00.grib2`)
    pub remote_id: String,
    /// Size declared by the listing
    pub size_bytes: u64,
    /// Date the object was listed under
    pub date: DateKey,
}

impl CandidateFile {
    /// Final path component of the remote URL
    pub fn file_name(&self) -> &str {
        remote_basename(&self.remote_id)
    }
}

/// A candidate that was transferred into the run's working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// Where the payload now lives
    pub local_path: PathBuf,
    /// Remote URL it came from
    pub source_id: String,
    /// Size on disk after the transfer
    pub size_bytes: u64,
}

impl DownloadedFile {
    /// File name of the local copy (what the validator selects on)
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// How a single validation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Validator exited with code zero
    Passed,
    /// Validator exited with a non-zero code, or ran no test for the file
    ///
    /// The code is None when the process was killed by a signal or exited
    /// zero without running the file's test.
    Failed {
        /// Exit code reported by the validator
        exit_code: Option<i32>,
    },
    /// Validator exceeded its time limit
    TimedOut,
    /// Validator could not be invoked at all
    Error {
        /// Why the invocation failed
        reason: String,
    },
}

impl ValidationStatus {
    /// Whether this status counts as a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of validating one downloaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Name the file was selected by
    pub file_name: String,
    /// Local path of the validated file
    pub local_path: PathBuf,
    /// How the validation ended
    #[serde(flatten)]
    pub status: ValidationStatus,
    /// Combined standard output and standard error of the validator
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub captured_output: String,
}

impl ValidationOutcome {
    /// Whether the file passed validation
    pub fn passed(&self) -> bool {
        self.status.is_pass()
    }
}

/// Why the discovery loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The candidate pool reached the requested count
    Filled,
    /// The date-try cap was reached first
    DateCapReached,
    /// Every date in the window was tried
    WindowExhausted,
}

/// Progress of the discovery loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchState {
    /// Number of distinct dates queried
    pub dates_tried: usize,
    /// Number of queried dates that contributed at least one candidate
    pub dates_with_files: usize,
    /// Candidates collected so far, in discovery order
    pub collected: Vec<CandidateFile>,
}

impl SearchState {
    /// Slots still open in a pool of `target` candidates
    pub fn remaining(&self, target: usize) -> usize {
        target.saturating_sub(self.collected.len())
    }
}

/// Final path component of a remote URL
pub fn remote_basename(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
}
