//! Capabilities the pipeline consumes from whatever drives the browser.
//!
//! Every call is awaited to completion before the next one is issued, and an
//! implementation only returns once the page has settled. Documents are the
//! rendered HTML source as a string.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::DateRange;

/// What a search produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The portal reported that nothing matched.
    NoRecords,
    /// The first results page is loaded.
    Results { document: String },
}

/// Result of asking for the next results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The next page is loaded and settled.
    Advanced,
    /// There is no next-page control on the current page.
    NoNextPage,
}

/// The search listing: run a search, read the current page, page forward.
pub trait SearchSession {
    /// Apply the date range and run the search.
    async fn search(&mut self, range: &DateRange) -> Result<SearchOutcome>;

    /// Rendered document of the results page currently shown.
    async fn results_document(&mut self) -> Result<String>;

    /// Move to the next results page.
    async fn next_page(&mut self) -> Result<Advance>;
}

/// Detail-page browsing.
pub trait BrowserSession {
    /// Load `url` and return the settled document.
    async fn navigate(&mut self, url: &str) -> Result<String>;

    /// Rendered document of the current page.
    async fn current_document(&mut self) -> Result<String>;

    /// URL of the current page (after any redirects).
    async fn current_url(&mut self) -> Result<String>;

    /// Expand collapsed sections. Returns whether anything was expanded.
    async fn expand_all(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Release the underlying browser. Called once, on every exit path.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
