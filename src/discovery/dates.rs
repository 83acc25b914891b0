//! Trailing window of candidate dates

use crate::types::DateKey;
use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;

/// A fixed-length window of recent days, ending a few days before "today"
///
/// With the stock settings the window covers yesterday and the ten days
/// before it; the most recent day is skipped because its data is often
/// still being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Days between the window start and the window end
    pub days_back: u32,
    /// Days between today and the window end
    pub end_offset_days: u32,
}

impl DateWindow {
    /// Window ending `end_offset_days` before today and spanning `days_back` more days
    pub fn new(days_back: u32, end_offset_days: u32) -> Self {
        Self {
            days_back,
            end_offset_days,
        }
    }

    /// Every date key in the window, oldest first
    pub fn keys(&self, today: NaiveDate) -> Vec<DateKey> {
        let Some(end) = today.checked_sub_days(Days::new(u64::from(self.end_offset_days))) else {
            return Vec::new();
        };
        let start = end
            .checked_sub_days(Days::new(u64::from(self.days_back)))
            .unwrap_or(NaiveDate::MIN);

        start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(DateKey::from_date)
            .collect()
    }

    /// Every date key in the window, in random order
    pub fn shuffled<R: Rng + ?Sized>(&self, today: NaiveDate, rng: &mut R) -> Vec<DateKey> {
        let mut keys = self.keys(today);
        keys.shuffle(rng);
        keys
    }
}
