//! Shared types, error model, configuration, and session traits for datrack.
//!
//! This crate is the foundation depended on by all other datrack crates.
//! It provides:
//! - [`DatrackError`]: the unified error type
//! - Domain types ([`Candidate`], [`Record`], [`DateRange`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)
//! - The [`SearchSession`] / [`BrowserSession`] capabilities the pipeline drives

pub mod config;
pub mod error;
pub mod html;
pub mod progress;
pub mod session;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, OutputConfig, PortalConfig, RunConfig, SearchConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DatrackError, Result};
pub use progress::{ProgressReporter, SilentProgress};
pub use session::{Advance, BrowserSession, SearchOutcome, SearchSession};
pub use types::{Candidate, DateRange, NOT_REQUIRED, PORTAL_DATE_FORMAT, Record};
