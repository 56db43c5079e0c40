//! Error types for datrack.
//!
//! Library crates use [`DatrackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all datrack operations.
#[derive(Debug, thiserror::Error)]
pub enum DatrackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The search could not be established; nothing has been collected.
    #[error("setup failed at {step}: {message}")]
    Setup { step: String, message: String },

    /// WebDriver or browser session error.
    #[error("browser error: {0}")]
    Browser(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// CSV serialization error.
    #[error("export error: {0}")]
    Export(String),

    /// Data validation error (bad date, non-absolute root URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DatrackError>;

impl DatrackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a setup error for the named step.
    pub fn setup(step: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Setup {
            step: step.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the run never got as far as collecting data.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup { .. })
    }
}
