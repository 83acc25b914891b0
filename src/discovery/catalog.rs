//! Per-date listing of the remote archive
//!
//! The scanner turns one date key into a handful of eligible files. Nothing
//! that goes wrong while listing a date escapes this module: unavailable
//! dates, timeouts and unparseable output all come back as an empty
//! [`DateScan`] with a status explaining why.

use crate::process::{CapturedOutput, ToolOutcome};
use crate::types::{CandidateFile, DateKey};
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Lists remote objects under a path prefix
///
/// Implementations return the raw long-form listing (`<size> <timestamp>
/// <url>` per line) inside a [`CapturedOutput`]; a non-zero exit means the
/// prefix could not be listed.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// List everything directly under `path`
    async fn list(&self, path: &str) -> ToolOutcome<CapturedOutput>;
}

/// Name and size rules a listed object must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    /// Required suffix of the object URL
    pub extension: String,
    /// Marker that must appear somewhere in the URL
    pub variant_marker: String,
    /// Inclusive size ceiling (None = unconstrained)
    pub max_size_bytes: Option<u64>,
}

impl CatalogFilter {
    /// Whether an object with this URL and size is eligible
    pub fn accepts(&self, url: &str, size_bytes: u64) -> bool {
        url.ends_with(&self.extension)
            && url.contains(&self.variant_marker)
            && self.max_size_bytes.is_none_or(|max| size_bytes <= max)
    }
}

/// Parse a long-form listing and keep the entries `filter` accepts
///
/// Lines with fewer than three fields or a non-numeric size (headers, the
/// `TOTAL:` footer) are skipped.
pub fn parse_listing(listing: &str, date: &DateKey, filter: &CatalogFilter) -> Vec<CandidateFile> {
    listing
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let url = *parts.last()?;
            let size_bytes = parts[0].parse::<u64>().ok()?;
            filter.accepts(url, size_bytes).then(|| CandidateFile {
                remote_id: url.to_string(),
                size_bytes,
                date: date.clone(),
            })
        })
        .collect()
}

/// Why a date scan produced what it did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// At least one candidate was selected
    Found,
    /// The date was listed but nothing passed the filters
    NoMatches,
    /// The listing call exited non-zero (date not published, access denied, ...)
    Unavailable,
    /// The listing call exceeded its time limit
    TimedOut,
    /// The listing call could not be made
    Error(String),
}

/// Result of scanning one date
#[derive(Debug, Clone)]
pub struct DateScan {
    /// Date that was scanned
    pub date: DateKey,
    /// Selected candidates (empty unless status is [`ScanStatus::Found`])
    pub candidates: Vec<CandidateFile>,
    /// Why the candidates are what they are
    pub status: ScanStatus,
}

impl DateScan {
    fn empty(date: &DateKey, status: ScanStatus) -> Self {
        Self {
            date: date.clone(),
            candidates: Vec::new(),
            status,
        }
    }
}

/// Lists one date of the archive and picks random eligible files from it
pub struct CatalogScanner {
    lister: Arc<dyn ObjectLister>,
    bucket: String,
    region: String,
    filter: CatalogFilter,
}

impl CatalogScanner {
    /// Scanner over `<bucket>/hrrr.<date>/<region>/`
    pub fn new(
        lister: Arc<dyn ObjectLister>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        filter: CatalogFilter,
    ) -> Self {
        Self {
            lister,
            bucket: bucket.into(),
            region: region.into(),
            filter,
        }
    }

    /// Listing path for one date
    pub fn listing_path(&self, date: &DateKey) -> String {
        format!(
            "{}/hrrr.{}/{}/",
            self.bucket.trim_end_matches('/'),
            date,
            self.region
        )
    }

    /// Pick up to `count` random eligible files from `date`
    pub async fn scan<R: Rng + ?Sized>(&self, date: &DateKey, count: usize, rng: &mut R) -> DateScan {
        let path = self.listing_path(date);

        let output = match self.lister.list(&path).await {
            ToolOutcome::Completed(output) => output,
            ToolOutcome::TimedOut { after } => {
                tracing::debug!(date = %date, ?after, "listing timed out");
                return DateScan::empty(date, ScanStatus::TimedOut);
            }
            ToolOutcome::Failed { reason } => {
                tracing::debug!(date = %date, %reason, "listing failed");
                return DateScan::empty(date, ScanStatus::Error(reason));
            }
        };

        if !output.status.is_success() {
            tracing::debug!(date = %date, code = ?output.status.code(), "date not available");
            return DateScan::empty(date, ScanStatus::Unavailable);
        }

        let mut eligible = parse_listing(&output.stdout, date, &self.filter);
        tracing::debug!(date = %date, eligible = eligible.len(), "parsed listing");

        eligible.shuffle(rng);
        eligible.truncate(count);

        if eligible.is_empty() {
            DateScan::empty(date, ScanStatus::NoMatches)
        } else {
            DateScan {
                date: date.clone(),
                candidates: eligible,
                status: ScanStatus::Found,
            }
        }
    }
}
