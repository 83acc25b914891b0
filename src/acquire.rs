//! Transfer of selected candidates into the run's working directory

use crate::console::{Console, Tone};
use crate::process::{CapturedOutput, ToolOutcome};
use crate::types::{CandidateFile, DownloadedFile};
use crate::workdir::WorkDir;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Copies one remote object to a local path
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Copy `url` to `dest`
    ///
    /// A zero exit status alone does not prove success; the caller also
    /// checks that `dest` exists afterwards.
    async fn fetch(&self, url: &str, dest: &Path) -> ToolOutcome<CapturedOutput>;
}

/// Why a candidate was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The transfer exited non-zero
    TransferFailed(Option<i32>),
    /// The transfer exceeded its time limit
    TimedOut,
    /// The transfer could not be started
    Error(String),
    /// The transfer reported success but left no file behind
    MissingFile,
}

/// A candidate that did not make it to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedCandidate {
    /// Remote URL that was attempted
    pub remote_id: String,
    /// What went wrong
    pub reason: DropReason,
}

/// Everything the acquirer did in one run
#[derive(Debug, Clone, Default)]
pub struct AcquisitionReport {
    /// Files now present in the working directory, in candidate order
    pub downloaded: Vec<DownloadedFile>,
    /// Candidates that were skipped
    pub dropped: Vec<DroppedCandidate>,
}

impl AcquisitionReport {
    /// Number of transfers attempted
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.dropped.len()
    }
}

/// Downloads candidates one at a time, skipping any that fail
pub struct FileAcquirer<'a> {
    fetcher: Arc<dyn ObjectFetcher>,
    work_dir: &'a WorkDir,
    console: &'a Console,
}

impl<'a> FileAcquirer<'a> {
    /// Acquirer writing into `work_dir`
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, work_dir: &'a WorkDir, console: &'a Console) -> Self {
        Self {
            fetcher,
            work_dir,
            console,
        }
    }

    /// Download every candidate in order
    ///
    /// Failures are recorded and skipped; nothing is retried.
    pub async fn acquire_all(&self, candidates: &[CandidateFile]) -> AcquisitionReport {
        let mut report = AcquisitionReport::default();

        for candidate in candidates {
            match self.acquire(candidate).await {
                Ok(file) => report.downloaded.push(file),
                Err(reason) => report.dropped.push(DroppedCandidate {
                    remote_id: candidate.remote_id.clone(),
                    reason,
                }),
            }
        }

        tracing::info!(
            downloaded = report.downloaded.len(),
            dropped = report.dropped.len(),
            "acquisition finished"
        );

        report
    }

    async fn acquire(&self, candidate: &CandidateFile) -> Result<DownloadedFile, DropReason> {
        let name = candidate.file_name();
        let dest = self.destination_for(candidate).await;
        self.console.line(Tone::Info, &format!("Downloading: {}", name));

        let reason = match self.fetcher.fetch(&candidate.remote_id, &dest).await {
            ToolOutcome::Completed(output) if output.status.is_success() => {
                match tokio::fs::metadata(&dest).await {
                    Ok(meta) if meta.is_file() => {
                        let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
                        self.console.line(
                            Tone::Success,
                            &format!("✓ Downloaded: {} ({:.1} MB)", name, size_mb),
                        );
                        return Ok(DownloadedFile {
                            local_path: dest,
                            source_id: candidate.remote_id.clone(),
                            size_bytes: meta.len(),
                        });
                    }
                    _ => {
                        self.console
                            .line(Tone::Warning, &format!("✗ Failed to download {}", name));
                        DropReason::MissingFile
                    }
                }
            }
            ToolOutcome::Completed(output) => {
                self.console
                    .line(Tone::Warning, &format!("✗ Failed to download {}", name));
                DropReason::TransferFailed(output.status.code())
            }
            ToolOutcome::TimedOut { .. } => {
                self.console
                    .line(Tone::Warning, &format!("✗ Timeout downloading {}", name));
                DropReason::TimedOut
            }
            ToolOutcome::Failed { reason } => {
                self.console.line(
                    Tone::Warning,
                    &format!("✗ Error downloading {}: {}", name, reason),
                );
                DropReason::Error(reason)
            }
        };

        tracing::warn!(url = %candidate.remote_id, ?reason, "dropping candidate");
        // A failed transfer may leave a partial file behind; it must not be validated.
        tokio::fs::remove_file(&dest).await.ok();
        Err(reason)
    }

    /// Local path for a candidate
    ///
    /// Files keep their remote name. HRRR reuses names across days, so a
    /// second file with the same name is prefixed with its date key.
    async fn destination_for(&self, candidate: &CandidateFile) -> PathBuf {
        let plain = self.work_dir.path().join(candidate.file_name());
        if tokio::fs::try_exists(&plain).await.unwrap_or(false) {
            self.work_dir
                .path()
                .join(format!("{}_{}", candidate.date, candidate.file_name()))
        } else {
            plain
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::NoColor;
    use crate::types::DateKey;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Script {
        Write,
        ExitZeroNoFile,
        ExitNonZero,
        PartialThenFail,
        Timeout,
    }

    struct ScriptedFetcher(HashMap<String, Script>);

    #[async_trait]
    impl ObjectFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> ToolOutcome<CapturedOutput> {
            match self.0.get(url).copied().unwrap_or(Script::ExitNonZero) {
                Script::Write => {
                    tokio::fs::write(dest, b"GRIB....7777").await.unwrap();
                    ToolOutcome::Completed(CapturedOutput::success(""))
                }
                Script::ExitZeroNoFile => ToolOutcome::Completed(CapturedOutput::success("")),
                Script::ExitNonZero => ToolOutcome::Completed(CapturedOutput::failure(1, "AccessDenied")),
                Script::PartialThenFail => {
                    tokio::fs::write(dest, b"GRI").await.unwrap();
                    ToolOutcome::Completed(CapturedOutput::failure(1, "connection reset"))
                }
                Script::Timeout => ToolOutcome::TimedOut {
                    after: Duration::from_secs(300),
                },
            }
        }
    }

    fn candidate(date: &str, name: &str) -> CandidateFile {
        CandidateFile {
            remote_id: format!("gs://bucket/hrrr.{date}/conus/{name}"),
            size_bytes: 12,
            date: DateKey::from_date(NaiveDate::parse_from_str(date, "%Y%m%d").unwrap()),
        }
    }

    async fn work_dir(root: &Path) -> WorkDir {
        let started = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        WorkDir::create(root, started).await.unwrap()
    }

    #[tokio::test]
    async fn test_failures_are_dropped_and_run_continues() {
        let root = tempfile::tempdir().unwrap();
        let work_dir = work_dir(root.path()).await;
        let candidates = vec![
            candidate("20240101", "a.wrfnatf00.grib2"),
            candidate("20240101", "b.wrfnatf00.grib2"),
            candidate("20240102", "c.wrfnatf00.grib2"),
            candidate("20240102", "d.wrfnatf00.grib2"),
            candidate("20240103", "e.wrfnatf00.grib2"),
        ];
        let fetcher = ScriptedFetcher(HashMap::from([
            (candidates[0].remote_id.clone(), Script::Write),
            (candidates[1].remote_id.clone(), Script::Timeout),
            (candidates[2].remote_id.clone(), Script::ExitZeroNoFile),
            (candidates[3].remote_id.clone(), Script::PartialThenFail),
            (candidates[4].remote_id.clone(), Script::Write),
        ]));
        let (console, buffer) = Console::buffered(Arc::new(NoColor));

        let report = FileAcquirer::new(Arc::new(fetcher), &work_dir, &console)
            .acquire_all(&candidates)
            .await;

        let names: Vec<String> = report.downloaded.iter().map(DownloadedFile::file_name).collect();
        assert_eq!(names, vec!["a.wrfnatf00.grib2", "e.wrfnatf00.grib2"]);
        assert!(report.downloaded.iter().all(|f| f.local_path.exists()));
        assert_eq!(report.attempted(), 5);

        let reasons: Vec<&DropReason> = report.dropped.iter().map(|d| &d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                &DropReason::TimedOut,
                &DropReason::MissingFile,
                &DropReason::TransferFailed(Some(1))
            ]
        );
        assert!(!work_dir.path().join("d.wrfnatf00.grib2").exists());

        let out = buffer.contents();
        assert!(out.contains("✗ Timeout downloading b.wrfnatf00.grib2"));
        assert!(out.contains("✓ Downloaded: a.wrfnatf00.grib2 (0.0 MB)"));
    }

    #[tokio::test]
    async fn test_same_name_from_two_dates_gets_distinct_paths() {
        let root = tempfile::tempdir().unwrap();
        let work_dir = work_dir(root.path()).await;
        let candidates = vec![
            candidate("20240101", "hrrr.t00z.wrfnatf00.grib2"),
            candidate("20240102", "hrrr.t00z.wrfnatf00.grib2"),
        ];
        let fetcher = ScriptedFetcher(
            candidates
                .iter()
                .map(|c| (c.remote_id.clone(), Script::Write))
                .collect(),
        );
        let (console, _buffer) = Console::buffered(Arc::new(NoColor));

        let report = FileAcquirer::new(Arc::new(fetcher), &work_dir, &console)
            .acquire_all(&candidates)
            .await;

        assert_eq!(report.downloaded.len(), 2);
        assert_eq!(report.downloaded[0].file_name(), "hrrr.t00z.wrfnatf00.grib2");
        assert_eq!(
            report.downloaded[1].file_name(),
            "20240102_hrrr.t00z.wrfnatf00.grib2"
        );
    }
}
