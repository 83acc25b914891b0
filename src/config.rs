//! Configuration types for hrrr-sampler

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest date window (and window offset) accepted, in days
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Where and how to search the remote archive
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Bucket URL holding the dataset (default: "gs://high-resolution-rapid-refresh")
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Model domain directory inside each date folder (default: "conus")
    #[serde(default = "default_region")]
    pub region: String,

    /// Required file extension (default: ".grib2")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Required content-variant marker in the object name (default: ".wrfnatf")
    #[serde(default = "default_variant_marker")]
    pub variant_marker: String,

    /// How many days before the window end the window starts (default: 10)
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// How many days before today the window ends (default: 1)
    ///
    /// The current day is usually still being published, so the window
    /// ends yesterday by default.
    #[serde(default = "default_end_offset_days")]
    pub end_offset_days: u32,

    /// Candidates requested from each date (default: 2)
    #[serde(default = "default_per_date_quota")]
    pub per_date_quota: usize,

    /// Maximum number of distinct dates queried per run (default: 20)
    #[serde(default = "default_max_dates")]
    pub max_dates: usize,

    /// Time limit for one listing call (default: 15 seconds)
    #[serde(default = "default_listing_timeout", with = "duration_serde")]
    pub listing_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            extension: default_extension(),
            variant_marker: default_variant_marker(),
            days_back: default_days_back(),
            end_offset_days: default_end_offset_days(),
            per_date_quota: default_per_date_quota(),
            max_dates: default_max_dates(),
            listing_timeout: default_listing_timeout(),
        }
    }
}

/// Per-run operator choices
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of files to test (default: 5)
    #[serde(default = "default_num_files")]
    pub num_files: usize,

    /// Maximum file size in megabytes (None = unconstrained)
    #[serde(default)]
    pub max_size_mb: Option<f64>,

    /// Keep downloaded files after the run (default: false)
    #[serde(default)]
    pub keep_files: bool,

    /// Show validator output for passing files too (default: false)
    #[serde(default)]
    pub verbose: bool,

    /// Directory under which each run creates its working directory (default: "testgribs")
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Seed for date and candidate shuffling (None = fresh entropy every run)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_files: default_num_files(),
            max_size_mb: None,
            keep_files: false,
            verbose: false,
            output_root: default_output_root(),
            seed: None,
        }
    }
}

impl RunConfig {
    /// Size ceiling in bytes, if one is configured
    ///
    /// Megabytes are binary (1 MB = 1024 * 1024 bytes).
    pub fn max_size_bytes(&self) -> Option<u64> {
        self.max_size_mb
            .map(|mb| (mb * 1024.0 * 1024.0).floor() as u64)
    }
}

/// External tool paths
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to gsutil executable (auto-detected if None)
    #[serde(default)]
    pub gsutil_path: Option<PathBuf>,

    /// Path to wgrib2 executable (auto-detected if None)
    #[serde(default)]
    pub wgrib2_path: Option<PathBuf>,

    /// Path to go executable (auto-detected if None)
    #[serde(default)]
    pub go_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Time limit for one version probe (default: 5 seconds)
    #[serde(default = "default_version_timeout", with = "duration_serde")]
    pub version_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            gsutil_path: None,
            wgrib2_path: None,
            go_path: None,
            search_path: true,
            version_timeout: default_version_timeout(),
        }
    }
}

impl ToolsConfig {
    /// Program to invoke for a tool: the explicit path if configured, else the bare name
    pub fn program(&self, name: &str) -> PathBuf {
        self.explicit_path(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }

    /// Explicitly configured path for a tool, if any
    pub fn explicit_path(&self, name: &str) -> Option<&PathBuf> {
        match name {
            "gsutil" => self.gsutil_path.as_ref(),
            "wgrib2" => self.wgrib2_path.as_ref(),
            "go" => self.go_path.as_ref(),
            _ => None,
        }
    }
}

/// Time limits for transfers and validations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Time limit for one file transfer (default: 300 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download: Duration,

    /// Time limit for one validator invocation (default: 600 seconds)
    #[serde(default = "default_validation_timeout", with = "duration_serde")]
    pub validation: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            download: default_download_timeout(),
            validation: default_validation_timeout(),
        }
    }
}

/// How the validator harness is invoked
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Top-level Go test whose subtests are named after files (default: "TestIntegrationWithRealFiles")
    #[serde(default = "default_test_name")]
    pub test_name: String,

    /// Directory of the Go package under test (None = current directory)
    #[serde(default)]
    pub package_dir: Option<PathBuf>,

    /// Extra arguments appended after the selector (default: ["-no-size-limit"])
    #[serde(default = "default_extra_args")]
    pub extra_args: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            test_name: default_test_name(),
            package_dir: None,
            extra_args: default_extra_args(),
        }
    }
}

/// Main configuration for the sampling harness
///
/// Every field has a default, so an empty TOML file (or no file at all)
/// reproduces the stock behavior. Command-line flags are applied on top.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote search settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Operator choices for this run
    #[serde(default)]
    pub run: RunConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Transfer and validation time limits
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Validator invocation
    #[serde(default)]
    pub validator: ValidatorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.run.num_files == 0 {
            return Err(Error::config("run.num_files", "must be at least 1"));
        }
        if let Some(mb) = self.run.max_size_mb
            && !(mb.is_finite() && mb > 0.0)
        {
            return Err(Error::config(
                "run.max_size_mb",
                format!("must be a positive number of megabytes, got {mb}"),
            ));
        }
        if self.discovery.per_date_quota == 0 {
            return Err(Error::config("discovery.per_date_quota", "must be at least 1"));
        }
        if self.discovery.max_dates == 0 {
            return Err(Error::config("discovery.max_dates", "must be at least 1"));
        }
        if self.discovery.days_back > MAX_WINDOW_DAYS {
            return Err(Error::config(
                "discovery.days_back",
                format!("must be at most {MAX_WINDOW_DAYS}, got {}", self.discovery.days_back),
            ));
        }
        if self.discovery.end_offset_days > MAX_WINDOW_DAYS {
            return Err(Error::config(
                "discovery.end_offset_days",
                format!(
                    "must be at most {MAX_WINDOW_DAYS}, got {}",
                    self.discovery.end_offset_days
                ),
            ));
        }
        if self.discovery.bucket.trim().is_empty() {
            return Err(Error::config("discovery.bucket", "must not be empty"));
        }
        Ok(())
    }
}

fn default_bucket() -> String {
    "gs://high-resolution-rapid-refresh".to_string()
}

fn default_region() -> String {
    "conus".to_string()
}

fn default_extension() -> String {
    ".grib2".to_string()
}

fn default_variant_marker() -> String {
    ".wrfnatf".to_string()
}

fn default_days_back() -> u32 {
    10
}

fn default_end_offset_days() -> u32 {
    1
}

fn default_per_date_quota() -> usize {
    2
}

fn default_max_dates() -> usize {
    20
}

fn default_listing_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_num_files() -> usize {
    5
}

fn default_output_root() -> PathBuf {
    PathBuf::from("testgribs")
}

fn default_true() -> bool {
    true
}

fn default_version_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_validation_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_test_name() -> String {
    "TestIntegrationWithRealFiles".to_string()
}

fn default_extra_args() -> Vec<String> {
    vec!["-no-size-limit".to_string()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_harness() {
        let config = Config::default();
        assert_eq!(config.run.num_files, 5);
        assert_eq!(config.run.max_size_mb, None);
        assert!(!config.run.keep_files);
        assert_eq!(config.discovery.per_date_quota, 2);
        assert_eq!(config.discovery.max_dates, 20);
        assert_eq!(config.discovery.days_back, 10);
        assert_eq!(config.discovery.end_offset_days, 1);
        assert_eq!(config.discovery.listing_timeout, Duration::from_secs(15));
        assert_eq!(config.timeouts.download, Duration::from_secs(300));
        assert_eq!(config.timeouts.validation, Duration::from_secs(600));
        assert_eq!(config.tools.version_timeout, Duration::from_secs(5));
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.run.num_files, 5);
        assert_eq!(config.discovery.bucket, "gs://high-resolution-rapid-refresh");
        assert_eq!(config.validator.extra_args, vec!["-no-size-limit"]);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let raw = r#"
            [run]
            num_files = 3
            max_size_mb = 10.0

            [discovery]
            per_date_quota = 4
            listing_timeout = 30

            [timeouts]
            validation = 120
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.run.num_files, 3);
        assert_eq!(config.run.max_size_mb, Some(10.0));
        assert_eq!(config.discovery.per_date_quota, 4);
        assert_eq!(config.discovery.max_dates, 20);
        assert_eq!(config.discovery.listing_timeout, Duration::from_secs(30));
        assert_eq!(config.timeouts.validation, Duration::from_secs(120));
        assert_eq!(config.timeouts.download, Duration::from_secs(300));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampler.toml");
        std::fs::write(&path, "[run]\nkeep_files = true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.run.keep_files);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampler.toml");
        std::fs::write(&path, "[run\nnum_files = ").unwrap();

        assert!(matches!(Config::load(&path), Err(Error::TomlDe(_))));
    }

    #[test]
    fn test_max_size_bytes_uses_binary_megabytes() {
        let mut run = RunConfig::default();
        assert_eq!(run.max_size_bytes(), None);

        run.max_size_mb = Some(10.0);
        assert_eq!(run.max_size_bytes(), Some(10 * 1024 * 1024));

        run.max_size_mb = Some(0.5);
        assert_eq!(run.max_size_bytes(), Some(512 * 1024));
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        let mut config = Config::default();
        config.run.num_files = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(ref k), .. }) if k == "run.num_files"
        ));

        let mut config = Config::default();
        config.run.max_size_mb = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.run.max_size_mb = Some(f64::NAN);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.discovery.per_date_quota = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.discovery.max_dates = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_the_date_window() {
        let mut config = Config::default();
        config.discovery.days_back = MAX_WINDOW_DAYS;
        config.validate().unwrap();

        config.discovery.days_back = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(ref k), .. }) if k == "discovery.days_back"
        ));

        let mut config = Config::default();
        config.discovery.end_offset_days = MAX_WINDOW_DAYS + 1;
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(ref k), .. }) if k == "discovery.end_offset_days"
        ));
    }

    #[test]
    fn test_tool_program_prefers_explicit_path() {
        let mut tools = ToolsConfig::default();
        assert_eq!(tools.program("gsutil"), PathBuf::from("gsutil"));

        tools.gsutil_path = Some(PathBuf::from("/opt/google-cloud-sdk/bin/gsutil"));
        assert_eq!(
            tools.program("gsutil"),
            PathBuf::from("/opt/google-cloud-sdk/bin/gsutil")
        );
        assert_eq!(tools.explicit_path("wgrib2"), None);
    }
}
