//! Randomized search of the date-partitioned archive
//!
//! Discovery is three small pieces:
//!
//! - [`DateWindow`] produces the shuffled list of recent date keys
//! - [`CatalogScanner`] lists one date and picks random eligible files
//! - [`Discovery`] walks the dates until the pool is full or the date budget is spent
//!
//! All randomness comes from a caller-supplied [`rand::Rng`], so a seeded
//! generator reproduces the same search order.

mod catalog;
mod dates;
mod search;

pub use catalog::{CatalogFilter, CatalogScanner, DateScan, ObjectLister, ScanStatus, parse_listing};
pub use dates::DateWindow;
pub use search::{Discovery, SearchLimits, SearchResult};
