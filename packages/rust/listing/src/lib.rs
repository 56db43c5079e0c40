//! Search-results listing: link normalization, page parsing, and pagination.
//!
//! This crate provides:
//! - [`UrlNormalizer`]: resolves raw row links against the portal's two roots
//! - [`parse_page`]: extracts `(identifier, link)` rows from one results page
//! - [`parse_summary`]: reads the item/page totals shown under the grid
//! - [`collect`]: walks every results page into a deduplicated candidate list

pub mod collector;
pub mod normalize;
pub mod page;
pub mod summary;

pub use collector::{CandidateSet, Collection, Completion, collect};
pub use normalize::UrlNormalizer;
pub use page::{ListingRow, TableMissing, parse_page};
pub use summary::{ResultSummary, has_no_records, parse_summary};
