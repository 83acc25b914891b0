//! Outcome aggregation, run summary and housekeeping

use crate::console::{Console, Tone};
use crate::error::{EXIT_FAILURE, EXIT_SUCCESS, Result};
use crate::types::{CandidateFile, DownloadedFile, StopReason, ValidationOutcome};
use crate::workdir::WorkDir;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 60;

/// Accumulates one outcome per validated file
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    outcomes: Vec<ValidationOutcome>,
}

impl RunReport {
    /// Report over `outcomes`, kept in validation order
    pub fn new(outcomes: Vec<ValidationOutcome>) -> Self {
        Self { outcomes }
    }

    /// All outcomes in validation order
    pub fn outcomes(&self) -> &[ValidationOutcome] {
        &self.outcomes
    }

    /// Number of files tested
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of passing files
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    /// Number of failing files
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Names of failing files, in the order they were validated
    pub fn failed_names(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed())
            .map(|o| o.file_name.clone())
            .collect()
    }

    /// At least one file was tested and every one passed
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(ValidationOutcome::passed)
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    /// Print totals and the failing file names
    pub fn print_summary(&self, console: &Console) {
        console.blank();
        console.rule(Tone::Info, '═', RULE_WIDTH);
        console.line(Tone::Emphasis, "  Test Summary");
        console.rule(Tone::Info, '═', RULE_WIDTH);
        console.blank();

        console.raw(&format!("Total files tested: {}", self.total()));
        console.line(Tone::Success, &format!("Passed: {}", self.passed()));

        let failed = self.failed_names();
        if !failed.is_empty() {
            console.line(Tone::Error, &format!("Failed: {}", failed.len()));
            console.blank();
            console.line(Tone::Error, "Failed files:");
            for name in &failed {
                console.raw(&format!("  {} {}", console.paint(Tone::Error, "✗"), name));
            }
        }
    }
}

/// Delete the working directory unless the operator asked to keep it
///
/// Returns whether the directory was retained.
pub async fn finish_work_dir(work_dir: &WorkDir, keep_files: bool, console: &Console) -> Result<bool> {
    console.blank();
    if keep_files {
        console.raw(&format!(
            "Test files kept at: {}",
            console.paint(Tone::Location, &work_dir.path().display().to_string())
        ));
        tracing::info!(path = ?work_dir.path(), "working directory retained");
        return Ok(true);
    }

    console.line(Tone::Warning, "Cleaning up downloaded files...");
    work_dir.remove().await?;
    console.line(Tone::Success, "Cleanup complete.");
    Ok(false)
}

/// Machine-readable record of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Distinct dates queried during discovery
    pub dates_tried: usize,
    /// Queried dates that contributed candidates
    pub dates_with_files: usize,
    /// Why discovery stopped
    pub stop_reason: StopReason,
    /// Selected candidates, in discovery order
    pub candidates: Vec<CandidateFile>,
    /// Files that reached the working directory
    pub downloaded: Vec<DownloadedFile>,
    /// One outcome per downloaded file
    pub outcomes: Vec<ValidationOutcome>,
    /// Failing file names in validation order
    pub failed_files: Vec<String>,
    /// Run working directory
    pub work_dir: PathBuf,
    /// Whether the working directory was kept
    pub retained: bool,
    /// Process exit status
    pub exit_code: i32,
}

impl RunSummary {
    /// Whether the run counts as a success
    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
