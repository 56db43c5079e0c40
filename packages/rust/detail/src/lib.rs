//! Detail-page extraction and field cleaning.
//!
//! This crate provides:
//! - [`RecordExtractor`]: the seam the orchestrator extracts through
//! - [`DetailExtractor`]: reads the portal's labelled regions into a [`Record`]
//! - [`clean`]: the deterministic text rules applied to individual fields
//!
//! [`Record`]: datrack_shared::Record

pub mod clean;
mod extract;

pub use clean::{CONTACT_SENTINEL, FEES_SENTINEL};
pub use extract::{DetailExtractor, RecordExtractor};
