//! End-to-end sampling run
//!
//! [`Harness`] wires the stages together in a fixed, strictly sequential
//! order: dependency probe, discovery, acquisition, validation, report.
//! Each stage talks to the outside world only through the capability
//! traits it was handed, so the whole pipeline can be driven by fakes.

use crate::acquire::{FileAcquirer, ObjectFetcher};
use crate::config::Config;
use crate::console::{Console, Tone};
use crate::dependencies::DependencyProbe;
use crate::discovery::{CatalogFilter, CatalogScanner, DateWindow, Discovery, ObjectLister, SearchLimits};
use crate::error::{Error, Result};
use crate::gsutil::GsutilClient;
use crate::report::{RunReport, RunSummary, finish_work_dir};
use crate::validation::{GoTestValidator, ValidationRunner, Validator};
use crate::workdir::WorkDir;
use chrono::{Local, NaiveDateTime};
use rand::Rng;
use std::sync::Arc;

const HEADER_WIDTH: usize = 60;

/// One configured sampling run
pub struct Harness {
    config: Config,
    probe: DependencyProbe,
    lister: Arc<dyn ObjectLister>,
    fetcher: Arc<dyn ObjectFetcher>,
    validator: Arc<dyn Validator>,
    console: Console,
    now: Option<NaiveDateTime>,
}

impl Harness {
    /// Harness using the real tools: gsutil for the bucket, `go test` for validation
    pub fn new(config: Config, console: Console) -> Self {
        let gsutil = Arc::new(GsutilClient::from_config(&config));
        let validator = Arc::new(GoTestValidator::from_config(&config));
        let probe = DependencyProbe::from_config(&config.tools);
        Self::with_parts(config, probe, gsutil.clone(), gsutil, validator, console)
    }

    /// Harness over explicit capabilities
    pub fn with_parts(
        config: Config,
        probe: DependencyProbe,
        lister: Arc<dyn ObjectLister>,
        fetcher: Arc<dyn ObjectFetcher>,
        validator: Arc<dyn Validator>,
        console: Console,
    ) -> Self {
        Self {
            config,
            probe,
            lister,
            fetcher,
            validator,
            console,
            now: None,
        }
    }

    /// Pin the wall clock used for the date window and the work directory name
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Console the run reports to
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Execute the full pipeline
    ///
    /// Returns the run summary when the pipeline reaches the report stage;
    /// its `exit_code` says whether every file passed. Missing tools, an
    /// empty candidate pool and a run with no successful download are
    /// returned as errors after their explanation has been printed. An
    /// unusable configuration is rejected before anything is printed.
    pub async fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunSummary> {
        self.config.validate()?;
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());
        let run = &self.config.run;

        self.print_header();

        self.console.line(Tone::Info, "Checking dependencies...");
        let deps = self.probe.probe().await;
        deps.print(&self.console);
        if !deps.is_ready() {
            return Err(Error::MissingDependencies(deps.missing()));
        }

        let work_dir = WorkDir::create(&run.output_root, now).await?;
        self.console.raw(&format!(
            "Output directory: {}",
            self.console
                .paint(Tone::Location, &work_dir.path().display().to_string())
        ));
        self.console.blank();
        tracing::info!(path = ?work_dir.path(), "run started");

        // Discovery
        let discovery_cfg = &self.config.discovery;
        self.console
            .line(Tone::Info, "Generating date range from HRRR archive...");
        let window = DateWindow::new(discovery_cfg.days_back, discovery_cfg.end_offset_days);
        let dates = window.shuffled(now.date(), rng);
        self.console.line(
            Tone::Success,
            &format!(
                "Generated {} recent dates (last {} days)",
                dates.len(),
                discovery_cfg.days_back
            ),
        );

        self.console.blank();
        let search_line = match run.max_size_mb {
            Some(mb) => format!("Searching for {} files (max {} MB each)...", run.num_files, mb),
            None => format!("Searching for {} files (no size limit)...", run.num_files),
        };
        self.console.line(Tone::Info, &search_line);

        let scanner = CatalogScanner::new(
            self.lister.clone(),
            discovery_cfg.bucket.clone(),
            discovery_cfg.region.clone(),
            CatalogFilter {
                extension: discovery_cfg.extension.clone(),
                variant_marker: discovery_cfg.variant_marker.clone(),
                max_size_bytes: run.max_size_bytes(),
            },
        );
        let limits = SearchLimits {
            target: run.num_files,
            per_date_quota: discovery_cfg.per_date_quota,
            max_dates: discovery_cfg.max_dates,
        };
        let search = Discovery::new(&scanner, limits, &self.console, run.verbose)
            .run(&dates, rng)
            .await;
        let state = search.state;

        if state.collected.is_empty() {
            self.console.line(Tone::Error, "Error: No GRIB2 files found.");
            if run.max_size_mb.is_some() {
                self.console.line(Tone::Warning, "Try increasing --max-size");
            }
            self.discard(&work_dir).await;
            return Err(Error::NoCandidates {
                dates_tried: state.dates_tried,
            });
        }

        self.console.blank();
        self.console.line(
            Tone::Success,
            &format!("Selected {} files for testing", state.collected.len()),
        );
        self.console.raw(&format!(
            "  (Searched {} dates, found files in {} dates)",
            state.dates_tried, state.dates_with_files
        ));

        // Acquisition
        self.console.blank();
        self.console.line(Tone::Info, "Downloading files...");
        let acquisition = FileAcquirer::new(self.fetcher.clone(), &work_dir, &self.console)
            .acquire_all(&state.collected)
            .await;

        if acquisition.downloaded.is_empty() {
            self.console
                .line(Tone::Error, "Error: No files were successfully downloaded.");
            self.discard(&work_dir).await;
            return Err(Error::NoDownloads {
                attempted: acquisition.attempted(),
            });
        }

        self.console.blank();
        self.console.line(
            Tone::Success,
            &format!(
                "Successfully downloaded {} files",
                acquisition.downloaded.len()
            ),
        );

        // Validation
        self.console.blank();
        self.console.line(Tone::Info, "Running integration tests...");
        let outcomes = ValidationRunner::new(self.validator.clone(), &self.console, run.verbose)
            .validate_all(&acquisition.downloaded)
            .await;

        // Report and housekeeping
        let report = RunReport::new(outcomes);
        report.print_summary(&self.console);
        let retained = finish_work_dir(&work_dir, run.keep_files, &self.console).await?;

        if report.is_success() {
            self.console.blank();
            self.console.line(Tone::Success, "All tests passed! ✓");
        }

        tracing::info!(
            tested = report.total(),
            passed = report.passed(),
            failed = report.failed(),
            "run finished"
        );

        Ok(RunSummary {
            dates_tried: state.dates_tried,
            dates_with_files: state.dates_with_files,
            stop_reason: search.stop_reason,
            candidates: state.collected,
            downloaded: acquisition.downloaded,
            failed_files: report.failed_names(),
            exit_code: report.exit_code(),
            outcomes: report.outcomes().to_vec(),
            work_dir: work_dir.path().to_path_buf(),
            retained,
        })
    }

    fn print_header(&self) {
        let run = &self.config.run;
        self.console.rule(Tone::Info, '═', HEADER_WIDTH);
        self.console
            .line(Tone::Emphasis, "  HRRR Random GRIB2 Testing Script");
        self.console.line(
            Tone::Info,
            "  Validating GRIB2 decoding against wgrib2 on random HRRR files",
        );
        self.console.rule(Tone::Info, '═', HEADER_WIDTH);
        self.console.blank();

        self.console.raw(&format!(
            "Testing {} random GRIB2 files from HRRR dataset",
            self.console.paint(Tone::Success, &run.num_files.to_string())
        ));
        let limit = match run.max_size_mb {
            Some(mb) => format!("{} MB", self.console.paint(Tone::Success, &mb.to_string())),
            None => self.console.paint(Tone::Success, "no limit"),
        };
        self.console.raw(&format!("Max file size: {}", limit));
        self.console.blank();
    }

    /// Remove a work directory the run is abandoning, unless files are kept
    async fn discard(&self, work_dir: &WorkDir) {
        if self.config.run.keep_files {
            return;
        }
        if let Err(e) = work_dir.remove().await {
            tracing::warn!(error = %e, "could not remove abandoned working directory");
        }
    }
}
