//! Time-bounded execution of external commands
//!
//! Every call to an external tool (listing, transfer, validation, version
//! probe) goes through [`run_with_timeout`], which never returns an error:
//! spawn failures and timeouts are folded into a [`ToolOutcome`] so callers
//! decide per item how to continue.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited successfully (exit code 0)
    Success,
    /// The command exited with a non-zero exit code (None if terminated by a signal)
    Failure(Option<i32>),
}

impl ExitStatus {
    /// Returns `true` if the exit status represents success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Exit code, if the process exited normally
    pub fn code(self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failure(code) => code,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failure(status.code())
        }
    }
}

/// Captured result of a command that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// How the command exited
    pub status: ExitStatus,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CapturedOutput {
    /// A successful run with the given standard output
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Success,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited with `code` and printed `stderr`
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Failure(Some(code)),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Standard output followed by standard error, skipping empty streams
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end().is_empty(), self.stderr.trim_end().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

/// Outcome of one external call
///
/// `Completed` only means the process ran and exited within its time limit;
/// whether a non-zero exit is acceptable is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome<T> {
    /// The call finished within its time limit
    Completed(T),
    /// The call could not be made (binary missing, spawn error, ...)
    Failed {
        /// Why the call failed
        reason: String,
    },
    /// The call exceeded its time limit
    TimedOut {
        /// The limit that was exceeded
        after: Duration,
    },
}

impl<T> ToolOutcome<T> {
    /// The completed value, discarding failure details
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the call timed out
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Run `command` to completion, capturing both output streams, within `timeout`
///
/// Standard input is closed. A command still running at the deadline is
/// killed and reported as [`ToolOutcome::TimedOut`]; it is never retried.
pub async fn run_with_timeout(mut command: Command, timeout: Duration) -> ToolOutcome<CapturedOutput> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => {
            let status = ExitStatus::from(output.status);
            tracing::debug!(program = %program, code = ?status.code(), "command finished");
            ToolOutcome::Completed(CapturedOutput {
                status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
        Ok(Err(e)) => {
            tracing::warn!(program = %program, error = %e, "failed to run command");
            ToolOutcome::Failed {
                reason: format!("failed to execute {}: {}", program, e),
            }
        }
        Err(_) => {
            tracing::warn!(program = %program, timeout = ?timeout, "command timed out");
            ToolOutcome::TimedOut { after: timeout }
        }
    }
}
