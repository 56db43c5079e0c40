//! End-to-end `scrape` pipeline: search → collect → extract → export.

use tracing::{info, instrument, warn};

use datrack_detail::DetailExtractor;
use datrack_listing::{UrlNormalizer, collect, parse_summary};
use datrack_shared::{
    BrowserSession, DatrackError, ProgressReporter, Result, RunConfig, SearchOutcome,
    SearchSession,
};

use crate::orchestrator;
use crate::report::{RunReport, RunStatus};

/// Run the full pipeline on `session`, then close it.
///
/// 1. Search the configured date range
/// 2. Read the result totals
/// 3. Walk every results page into candidates
/// 4. Extract one record per candidate
/// 5. Export the records to CSV
///
/// The session is closed on every return path. No CSV is written unless at
/// least one record was extracted.
#[instrument(skip_all, fields(from = %config.range.start_text(), to = %config.range.end_text()))]
pub async fn run<S>(
    config: &RunConfig,
    mut session: S,
    progress: &dyn ProgressReporter,
) -> Result<RunReport>
where
    S: SearchSession + BrowserSession,
{
    let mut report = RunReport::start(config.range);
    info!(run_id = %report.run_id, "starting scrape");

    let result = execute(config, &mut session, progress, &mut report).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to close browser session");
    }

    let status = result?;
    report.finish(status);

    if let Some(path) = &config.report_path {
        report.write_json(path)?;
        info!(path = %path.display(), "run report written");
    }

    progress.done();
    info!(
        status = ?report.status,
        records = report.records,
        expected = report.expected_items,
        "scrape finished"
    );
    Ok(report)
}

async fn execute<S>(
    config: &RunConfig,
    session: &mut S,
    progress: &dyn ProgressReporter,
    report: &mut RunReport,
) -> Result<RunStatus>
where
    S: SearchSession + BrowserSession,
{
    // --- Phase 1: Search ---
    progress.phase("Searching");
    let document = match session.search(&config.range).await? {
        SearchOutcome::NoRecords => {
            info!("no applications in range");
            return Ok(RunStatus::NoRecords);
        }
        SearchOutcome::Results { document } => document,
    };

    let summary = parse_summary(&document).ok_or_else(|| {
        DatrackError::setup("read result summary", "item and page totals not found")
    })?;
    report.expected_items = summary.total_items;
    report.total_pages = summary.total_pages;
    info!(items = summary.total_items, pages = summary.total_pages, "search results");

    // --- Phase 2: Collect ---
    progress.phase("Collecting");
    let normalizer = UrlNormalizer::from_portal(&config.portal)?;
    let collection = collect(session, &normalizer, summary.total_pages, progress).await;
    report.record_collection(
        &collection.completion,
        collection.pages_visited,
        collection.rows_seen,
        collection.candidates.len(),
    );

    if collection.candidates.is_empty() {
        warn!("no eligible rows in results");
        return Ok(RunStatus::NothingCollected);
    }

    // --- Phase 3: Extract ---
    progress.phase("Extracting");
    let extractor = DetailExtractor::new();
    let harvest = orchestrator::run(session, &extractor, &collection.candidates, progress).await;
    report.record_harvest(&harvest);

    if harvest.records.is_empty() {
        warn!(candidates = collection.candidates.len(), "no records extracted");
        return Ok(RunStatus::NothingExtracted);
    }

    // --- Phase 4: Export ---
    progress.phase("Exporting");
    let summary = datrack_export::export(&harvest.records, &config.output_path)?;
    report.output_path = Some(summary.path);

    Ok(RunStatus::Exported)
}
