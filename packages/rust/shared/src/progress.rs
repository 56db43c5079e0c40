//! Progress callbacks for long-running stages.

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each results page is parsed.
    fn page_collected(&self, page: u32, total_pages: u32, candidates: usize);
    /// Called after each candidate is processed, kept or not.
    fn record_processed(&self, identifier: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_collected(&self, _page: u32, _total_pages: u32, _candidates: usize) {}
    fn record_processed(&self, _identifier: &str, _current: usize, _total: usize) {}
    fn done(&self) {}
}
