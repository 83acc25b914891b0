//! Per-file validation against the reference decoder
//!
//! The validator itself (decoding a GRIB2 file and comparing it with wgrib2)
//! lives outside this crate. Here it is a [`Validator`] capability that runs
//! one exact-match selector and reports how the run ended.
//! [`GoTestValidator`] drives the Go integration test suite; tests use
//! scripted fakes.

mod runner;

pub use go_test::GoTestValidator;
pub use runner::ValidationRunner;

use crate::process::{CapturedOutput, ToolOutcome};
use async_trait::async_trait;

/// Runs the external validation harness for one selector
#[async_trait]
pub trait Validator: Send + Sync {
    /// Build the selector that matches exactly the file named `file_name`
    fn selector_for(&self, file_name: &str) -> String;

    /// Run the harness restricted to `selector`
    ///
    /// Exit code zero is a pass; anything else is a fail.
    async fn run(&self, selector: &str) -> ToolOutcome<CapturedOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Anchored, escaped pattern matching exactly `literal`
///
/// Regex metacharacters in file names (the dots in `hrrr.t00z.grib2`, `+`,
/// brackets, ...) are escaped so the pattern cannot match any other name.
pub fn exact_match_pattern(literal: &str) -> String {
    format!("^{}$", regex::escape(literal))
}
