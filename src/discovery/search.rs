//! Bounded fill of the candidate pool across dates

use super::catalog::{CatalogScanner, DateScan, ScanStatus};
use crate::console::{Console, Tone};
use crate::types::{DateKey, SearchState, StopReason};
use rand::Rng;

/// Limits for one discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Requested pool size
    pub target: usize,
    /// Candidates requested from each date
    pub per_date_quota: usize,
    /// Maximum number of distinct dates queried
    pub max_dates: usize,
}

/// Final state of a discovery run
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Dates tried, dates with files, and the collected pool
    pub state: SearchState,
    /// Why the loop stopped
    pub stop_reason: StopReason,
}

/// Drives the catalog scanner date by date until the pool is full or the budget is spent
pub struct Discovery<'a> {
    scanner: &'a CatalogScanner,
    limits: SearchLimits,
    console: &'a Console,
    verbose: bool,
}

impl<'a> Discovery<'a> {
    /// Discovery over `scanner` bounded by `limits`
    pub fn new(scanner: &'a CatalogScanner, limits: SearchLimits, console: &'a Console, verbose: bool) -> Self {
        Self {
            scanner,
            limits,
            console,
            verbose,
        }
    }

    /// Walk `dates` in order, collecting candidates
    ///
    /// Stops as soon as the pool holds `target` candidates, after
    /// `max_dates` dates have been queried, or when `dates` runs out. The
    /// pool never grows beyond `target`.
    pub async fn run<R: Rng + ?Sized>(&self, dates: &[DateKey], rng: &mut R) -> SearchResult {
        let mut state = SearchState::default();

        for date in dates {
            if state.remaining(self.limits.target) == 0 {
                break;
            }

            state.dates_tried += 1;

            let scan = self.scanner.scan(date, self.limits.per_date_quota, rng).await;
            self.report_scan(&scan);

            if !scan.candidates.is_empty() {
                state.dates_with_files += 1;

                let room = state.remaining(self.limits.target);
                state
                    .collected
                    .extend(scan.candidates.into_iter().take(room));

                if !self.verbose && state.dates_with_files % 5 == 0 {
                    self.console.raw(&format!(
                        "  Found {} files so far (tried {} dates)...",
                        state.collected.len(),
                        state.dates_tried
                    ));
                }
            }

            if state.dates_tried >= self.limits.max_dates {
                if state.remaining(self.limits.target) > 0 {
                    self.console.blank();
                    self.console.line(
                        Tone::Warning,
                        &format!("Tried {} dates, stopping search.", state.dates_tried),
                    );
                }
                break;
            }
        }

        let stop_reason = if state.remaining(self.limits.target) == 0 {
            StopReason::Filled
        } else if state.dates_tried >= self.limits.max_dates {
            StopReason::DateCapReached
        } else {
            StopReason::WindowExhausted
        };

        tracing::info!(
            dates_tried = state.dates_tried,
            dates_with_files = state.dates_with_files,
            collected = state.collected.len(),
            ?stop_reason,
            "discovery finished"
        );

        SearchResult { state, stop_reason }
    }

    fn report_scan(&self, scan: &DateScan) {
        if !self.verbose {
            return;
        }
        let (tone, detail) = match &scan.status {
            ScanStatus::Found => (Tone::Success, format!("found {} file(s)", scan.candidates.len())),
            ScanStatus::NoMatches => (Tone::Warning, "no files within size limit".to_string()),
            ScanStatus::Unavailable => (Tone::Warning, "not found".to_string()),
            ScanStatus::TimedOut => (Tone::Warning, "timeout".to_string()),
            ScanStatus::Error(reason) => (Tone::Warning, format!("error: {}", reason)),
        };
        self.console.raw(&format!(
            "{} {}",
            self.console.paint(Tone::Info, &format!("Trying date {}...", scan.date)),
            self.console.paint(tone, &detail)
        ));
    }
}
