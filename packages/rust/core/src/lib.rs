//! Run orchestration for datrack.
//!
//! This crate ties the listing walk, detail extraction, and CSV export into
//! one end-to-end run ([`pipeline::run`]) and describes its result as a
//! [`RunReport`].

pub mod orchestrator;
pub mod pipeline;
pub mod report;

pub use orchestrator::{Harvest, Skip, SkipReason};
pub use report::{DataQuality, RunReport, RunStatus};
