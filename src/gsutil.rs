//! Google Cloud Storage access through the external `gsutil` binary

use crate::acquire::ObjectFetcher;
use crate::config::Config;
use crate::discovery::ObjectLister;
use crate::process::{CapturedOutput, ToolOutcome, run_with_timeout};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Lists and copies bucket objects with `gsutil`
///
/// Listing runs `gsutil ls -l <path>`; copying runs `gsutil -q cp <url> <dest>`.
/// Each call is bounded by its own time limit.
///
/// # Examples
///
/// ```no_run
/// use hrrr_sampler::gsutil::GsutilClient;
/// use hrrr_sampler::discovery::ObjectLister;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = GsutilClient::from_path(Duration::from_secs(15), Duration::from_secs(300))
///     .expect("gsutil not found in PATH");
/// let listing = client.list("gs://high-resolution-rapid-refresh/hrrr.20240101/conus/").await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GsutilClient {
    binary_path: PathBuf,
    listing_timeout: Duration,
    transfer_timeout: Duration,
}

impl GsutilClient {
    /// Client for an explicit binary path
    pub fn new(binary_path: PathBuf, listing_timeout: Duration, transfer_timeout: Duration) -> Self {
        Self {
            binary_path,
            listing_timeout,
            transfer_timeout,
        }
    }

    /// Attempt to find gsutil in PATH
    pub fn from_path(listing_timeout: Duration, transfer_timeout: Duration) -> Option<Self> {
        which::which("gsutil")
            .ok()
            .map(|path| Self::new(path, listing_timeout, transfer_timeout))
    }

    /// Client using the configured binary and time limits
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tools.program("gsutil"),
            config.discovery.listing_timeout,
            config.timeouts.download,
        )
    }

    /// Binary this client invokes
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl ObjectLister for GsutilClient {
    async fn list(&self, path: &str) -> ToolOutcome<CapturedOutput> {
        let mut command = Command::new(&self.binary_path);
        command.args(["ls", "-l", path]);
        run_with_timeout(command, self.listing_timeout).await
    }
}

#[async_trait]
impl ObjectFetcher for GsutilClient {
    async fn fetch(&self, url: &str, dest: &Path) -> ToolOutcome<CapturedOutput> {
        let mut command = Command::new(&self.binary_path);
        command.args(["-q", "cp", url]).arg(dest);
        run_with_timeout(command, self.transfer_timeout).await
    }
}
