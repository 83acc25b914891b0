//! Sequential validation of every downloaded file

use super::Validator;
use crate::console::{Console, Tone};
use crate::process::ToolOutcome;
use crate::types::{DownloadedFile, ValidationOutcome, ValidationStatus};
use std::sync::Arc;

const BANNER_WIDTH: usize = 60;

/// Validates downloaded files one at a time, in acquisition order
pub struct ValidationRunner<'a> {
    validator: Arc<dyn Validator>,
    console: &'a Console,
    verbose: bool,
}

impl<'a> ValidationRunner<'a> {
    /// Runner printing to `console`; `verbose` shows validator output for passes too
    pub fn new(validator: Arc<dyn Validator>, console: &'a Console, verbose: bool) -> Self {
        Self {
            validator,
            console,
            verbose,
        }
    }

    /// Validate every file, producing exactly one outcome per file
    pub async fn validate_all(&self, files: &[DownloadedFile]) -> Vec<ValidationOutcome> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            outcomes.push(self.validate(file).await);
        }
        outcomes
    }

    /// Validate one file
    pub async fn validate(&self, file: &DownloadedFile) -> ValidationOutcome {
        let name = file.file_name();
        self.print_banner(&name);

        let selector = self.validator.selector_for(&name);
        tracing::debug!(validator = self.validator.name(), %selector, "running validator");

        let (status, captured_output) = match self.validator.run(&selector).await {
            ToolOutcome::Completed(output) => {
                let combined = output.combined();
                let status = if output.status.is_success() {
                    ValidationStatus::Passed
                } else {
                    ValidationStatus::Failed {
                        exit_code: output.status.code(),
                    }
                };
                if (self.verbose || !status.is_pass()) && !combined.is_empty() {
                    self.console.raw(&combined);
                }
                (status, combined)
            }
            ToolOutcome::TimedOut { after } => {
                tracing::warn!(file = %name, ?after, "validation timed out");
                (ValidationStatus::TimedOut, String::new())
            }
            ToolOutcome::Failed { reason } => (ValidationStatus::Error { reason }, String::new()),
        };

        match &status {
            ValidationStatus::Passed => self.console.line(Tone::Success, &format!("✓ PASSED: {}", name)),
            ValidationStatus::Failed { .. } => self.console.line(Tone::Error, &format!("✗ FAILED: {}", name)),
            ValidationStatus::TimedOut => self.console.line(Tone::Error, &format!("✗ TIMEOUT: {}", name)),
            ValidationStatus::Error { reason } => self
                .console
                .line(Tone::Error, &format!("✗ ERROR testing {}: {}", name, reason)),
        }

        ValidationOutcome {
            file_name: name,
            local_path: file.local_path.clone(),
            status,
            captured_output,
        }
    }

    fn print_banner(&self, name: &str) {
        self.console.blank();
        self.console.rule(Tone::Info, '=', BANNER_WIDTH);
        self.console.line(Tone::Emphasis, &format!("Testing: {}", name));
        self.console.rule(Tone::Info, '=', BANNER_WIDTH);
    }
}
