//! Scripted collaborators for driving the harness end to end
//!
//! No fake here spawns a real gsutil or go process. The archive is an
//! in-memory table of listings, the fetcher writes small placeholder
//! payloads, and the validator answers from a list of failing names.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use hrrr_sampler::console::SharedBuffer;
use hrrr_sampler::dependencies::{DependencyProbe, ToolLocator};
use hrrr_sampler::{
    CapturedOutput, Config, Console, DateKey, Harness, NoColor, ObjectFetcher, ObjectLister,
    ToolOutcome, Validator,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const MB: u64 = 1024 * 1024;

/// Wall clock every scenario runs at: the default window is 2024-03-04..=2024-03-14
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap()
}

/// Date key `days` days before [`fixed_now`]
pub fn days_ago(days: u64) -> DateKey {
    DateKey::from_date(fixed_now().date() - chrono::Days::new(days))
}

/// What one date of the archive answers with
#[derive(Clone)]
pub enum Day {
    /// `(size, file name)` pairs, listed in this order
    Files(Vec<(u64, String)>),
    /// The listing exits non-zero
    Missing,
    /// The listing times out
    Timeout,
}

/// In-memory bucket keyed by date
pub struct FakeArchive {
    bucket: String,
    days: HashMap<String, Day>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeArchive {
    pub fn new(days: impl IntoIterator<Item = (DateKey, Day)>) -> Self {
        Self {
            bucket: Config::default().discovery.bucket,
            days: days
                .into_iter()
                .map(|(date, day)| (date.to_string(), day))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Remote URL of `name` under `date`
    pub fn url(&self, date: &DateKey, name: &str) -> String {
        format!("{}/hrrr.{}/conus/{}", self.bucket, date, name)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn render(&self, date: &str, files: &[(u64, String)]) -> String {
        let mut out = String::new();
        let mut total = 0;
        for (size, name) in files {
            total += size;
            out.push_str(&format!(
                "{:>11}  2024-03-01T00:55:12Z  {}/hrrr.{}/conus/{}\n",
                size, self.bucket, date, name
            ));
        }
        out.push_str(&format!("TOTAL: {} objects, {} bytes\n", files.len(), total));
        out
    }
}

#[async_trait]
impl ObjectLister for FakeArchive {
    async fn list(&self, path: &str) -> ToolOutcome<CapturedOutput> {
        self.calls.lock().unwrap().push(path.to_string());

        let date = path
            .split("hrrr.")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();

        match self.days.get(date).cloned().unwrap_or(Day::Missing) {
            Day::Files(files) => ToolOutcome::Completed(CapturedOutput::success(self.render(date, &files))),
            Day::Missing => ToolOutcome::Completed(CapturedOutput::failure(
                1,
                "CommandException: One or more URLs matched no objects.",
            )),
            Day::Timeout => ToolOutcome::TimedOut {
                after: Duration::from_secs(15),
            },
        }
    }
}

/// Writes a placeholder payload for every URL except the ones told to fail
#[derive(Default)]
pub struct FakeFetcher {
    failing: HashSet<String>,
    pub calls: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeFetcher {
    pub fn failing(urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            failing: urls.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> ToolOutcome<CapturedOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), dest.to_path_buf()));

        if self.failing.contains(url) {
            return ToolOutcome::Completed(CapturedOutput::failure(1, "AccessDeniedException: 403"));
        }
        tokio::fs::write(dest, b"GRIB\x00\x00\x00\x027777").await.unwrap();
        ToolOutcome::Completed(CapturedOutput::success(""))
    }
}

/// Passes every file except the ones named in `failing`
#[derive(Default)]
pub struct FakeValidator {
    failing: HashSet<String>,
    pub selectors: Mutex<Vec<String>>,
}

impl FakeValidator {
    pub fn failing(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            failing: names.into_iter().collect(),
            selectors: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.selectors.lock().unwrap().len()
    }
}

#[async_trait]
impl Validator for FakeValidator {
    fn selector_for(&self, file_name: &str) -> String {
        file_name.to_string()
    }

    async fn run(&self, selector: &str) -> ToolOutcome<CapturedOutput> {
        self.selectors.lock().unwrap().push(selector.to_string());
        if self.failing.contains(selector) {
            ToolOutcome::Completed(CapturedOutput::failure(
                1,
                format!("--- FAIL: TestIntegrationWithRealFiles/{selector}\nvalue mismatch"),
            ))
        } else {
            ToolOutcome::Completed(CapturedOutput::success(format!(
                "--- PASS: TestIntegrationWithRealFiles/{selector}"
            )))
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Never finishes a validation; signals `started` when the first one begins
#[derive(Default)]
pub struct BlockingValidator {
    pub started: Arc<Notify>,
}

#[async_trait]
impl Validator for BlockingValidator {
    fn selector_for(&self, file_name: &str) -> String {
        file_name.to_string()
    }

    async fn run(&self, _selector: &str) -> ToolOutcome<CapturedOutput> {
        self.started.notify_one();
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "blocking"
    }
}

/// Resolves every tool to `true` except the ones listed as missing
pub struct FakeLocator {
    missing: HashSet<String>,
}

impl FakeLocator {
    pub fn all_present() -> Self {
        Self {
            missing: HashSet::new(),
        }
    }

    pub fn missing(names: &[&str]) -> Self {
        Self {
            missing: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl ToolLocator for FakeLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        if self.missing.contains(name) {
            None
        } else {
            which::which("true").ok()
        }
    }
}

/// Collaborators for one scenario, kept so tests can inspect calls afterwards
pub struct Scenario {
    pub archive: Arc<FakeArchive>,
    pub fetcher: Arc<FakeFetcher>,
    pub validator: Arc<FakeValidator>,
    pub locator: FakeLocator,
    /// Replaces `validator` in the harness when set
    pub validator_override: Option<Arc<dyn Validator>>,
}

impl Scenario {
    pub fn new(archive: FakeArchive) -> Self {
        Self {
            archive: Arc::new(archive),
            fetcher: Arc::new(FakeFetcher::default()),
            validator: Arc::new(FakeValidator::default()),
            locator: FakeLocator::all_present(),
            validator_override: None,
        }
    }

    pub fn with_fetcher(mut self, fetcher: FakeFetcher) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_validator(mut self, validator: FakeValidator) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_any_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator_override = Some(validator);
        self
    }

    pub fn with_locator(mut self, locator: FakeLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Build the harness over these fakes; console output lands in the returned buffer
    pub fn harness(self, config: Config) -> (Harness, SharedBuffer, Fakes) {
        let (console, buffer) = Console::buffered(Arc::new(NoColor));
        let probe = DependencyProbe::new(Box::new(self.locator), Duration::from_secs(5));
        let fakes = Fakes {
            archive: self.archive.clone(),
            fetcher: self.fetcher.clone(),
            validator: self.validator.clone(),
        };
        let validator: Arc<dyn Validator> = match self.validator_override {
            Some(validator) => validator,
            None => self.validator,
        };
        let harness = Harness::with_parts(config, probe, self.archive, self.fetcher, validator, console)
        .with_clock(fixed_now());
        (harness, buffer, fakes)
    }
}

/// Handles on the fakes a harness was built with
pub struct Fakes {
    pub archive: Arc<FakeArchive>,
    pub fetcher: Arc<FakeFetcher>,
    pub validator: Arc<FakeValidator>,
}

/// Stock configuration writing under `root`
pub fn config_in(root: &Path) -> Config {
    let mut config = Config::default();
    config.run.output_root = root.to_path_buf();
    config
}

/// Entries directly under `root`
pub fn entries(root: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(root) {
        Ok(dir) => dir.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
