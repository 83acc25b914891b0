//! Per-run working directory

use crate::error::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory holding one run's downloaded payloads
///
/// Named `hrrr_random_<YYYYMMDD_HHMMSS>` under a fixed root. Nothing but
/// successfully downloaded files is ever written into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Directory name for a run started at `started`
    pub fn name_for(started: NaiveDateTime) -> String {
        format!("hrrr_random_{}", started.format("%Y%m%d_%H%M%S"))
    }

    /// Create (or reuse) the run directory under `root`
    pub async fn create(root: &Path, started: NaiveDateTime) -> Result<Self> {
        let path = root.join(Self::name_for(started));
        tokio::fs::create_dir_all(&path).await?;
        debug!(?path, "created working directory");
        Ok(Self { path })
    }

    /// Location of the directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory and everything in it
    ///
    /// A directory that is already gone counts as removed.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!(path = ?self.path, "removed working directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "failed to remove working directory");
                Err(e.into())
            }
        }
    }
}
