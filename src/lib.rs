//! # hrrr-sampler
//!
//! Random sampling and validation harness for the HRRR GRIB2 archive.
//!
//! A run picks a handful of recent files from the public HRRR bucket,
//! downloads them, and runs each one through an external validator that
//! compares a GRIB2 decoder against wgrib2. The result is a pass/fail
//! summary and a process exit status.
//!
//! ## Pipeline
//!
//! 1. **Dependency probe** - `gsutil`, `wgrib2` and `go` must be callable
//! 2. **Discovery** - shuffled dates from a trailing window are listed one at
//!    a time until enough eligible files are found or the date cap is hit
//! 3. **Acquisition** - each candidate is copied into a per-run directory;
//!    failed transfers are dropped
//! 4. **Validation** - one isolated validator run per downloaded file
//! 5. **Report** - summary, exit status, and cleanup of the run directory
//!
//! Every stage is strictly sequential. Per-item failures (a date that
//! cannot be listed, a transfer that times out, a failing validation) never
//! abort the run; only the conditions in [`Error`] do.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hrrr_sampler::{AnsiPalette, Config, Console, Harness};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.run.num_files = 3;
//!     config.run.max_size_mb = Some(150.0);
//!
//!     let harness = Harness::new(config, Console::stdout(Arc::new(AnsiPalette)));
//!     let mut rng = StdRng::from_entropy();
//!
//!     let summary = hrrr_sampler::run_until_interrupted(&harness, &mut rng).await?;
//!     std::process::exit(summary.exit_code);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// File transfer into the run directory
pub mod acquire;
/// Configuration types
pub mod config;
/// Operator console output
pub mod console;
/// External tool detection
pub mod dependencies;
/// Date window, catalog scanning and the discovery loop
pub mod discovery;
/// Error types
pub mod error;
/// gsutil-backed bucket access
pub mod gsutil;
/// End-to-end run orchestration
pub mod harness;
/// Time-bounded external process execution
pub mod process;
/// Outcome aggregation and housekeeping
pub mod report;
/// Core types
pub mod types;
/// Per-file validation
pub mod validation;
/// Per-run working directory
pub mod workdir;

// Re-export commonly used types
pub use acquire::{AcquisitionReport, FileAcquirer, ObjectFetcher};
pub use config::Config;
pub use console::{AnsiPalette, Console, NoColor, Palette, Tone};
pub use dependencies::{DependencyProbe, DependencyReport, PathLocator, ToolLocator};
pub use discovery::{CatalogScanner, DateWindow, Discovery, ObjectLister};
pub use error::{EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS, Error, Result};
pub use gsutil::GsutilClient;
pub use harness::Harness;
pub use process::{CapturedOutput, ExitStatus, ToolOutcome};
pub use report::{RunReport, RunSummary};
pub use types::{CandidateFile, DateKey, DownloadedFile, ValidationOutcome, ValidationStatus};
pub use validation::{GoTestValidator, ValidationRunner, Validator};
pub use workdir::WorkDir;

use rand::Rng;

/// Run the harness, aborting as soon as the process receives SIGINT or SIGTERM
///
/// See [`run_until`] for what an interrupted run leaves behind.
pub async fn run_until_interrupted<R: Rng + ?Sized>(harness: &Harness, rng: &mut R) -> Result<RunSummary> {
    run_until(harness, rng, wait_for_signal()).await
}

/// Run the harness until it finishes or `shutdown` resolves, whichever is first
///
/// An interrupted run skips the summary and the cleanup of its working
/// directory and yields [`Error::Interrupted`]. Any child process still
/// running is killed when its future is dropped.
pub async fn run_until<R, F>(harness: &Harness, rng: &mut R, shutdown: F) -> Result<RunSummary>
where
    R: Rng + ?Sized,
    F: Future<Output = ()>,
{
    tokio::select! {
        result = harness.run(rng) => result,
        _ = shutdown => {
            tracing::warn!("run interrupted");
            Err(Error::Interrupted)
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            ctrl_c_or_never().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c_or_never().await;
}

/// Resolve on Ctrl+C; never resolve if the listener cannot be installed
async fn ctrl_c_or_never() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
