//! Visit each candidate's detail page and extract its record.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use datrack_detail::RecordExtractor;
use datrack_shared::{BrowserSession, Candidate, ProgressReporter, Record, Result};

/// Why a candidate produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// A record with this identifier was already kept.
    Duplicate,
    /// The page could not be read as a detail page.
    Empty,
    /// Navigation or reading the page failed.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub identifier: String,
    pub reason: SkipReason,
}

/// Records extracted from the candidate list, in candidate order.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub records: Vec<Record>,
    pub skipped: Vec<Skip>,
}

impl Harvest {
    pub fn duplicates(&self) -> usize {
        self.count(|r| matches!(r, SkipReason::Duplicate))
    }

    pub fn empty(&self) -> usize {
        self.count(|r| matches!(r, SkipReason::Empty))
    }

    pub fn errors(&self) -> usize {
        self.count(|r| matches!(r, SkipReason::Error(_)))
    }

    fn count(&self, pred: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|s| pred(&s.reason)).count()
    }

    fn skip(&mut self, identifier: &str, reason: SkipReason) {
        self.skipped.push(Skip {
            identifier: identifier.to_string(),
            reason,
        });
    }
}

/// Extract one record per candidate. A failing candidate is recorded as a
/// skip and the run moves on; this never aborts.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub async fn run<S, E>(
    session: &mut S,
    extractor: &E,
    candidates: &[Candidate],
    progress: &dyn ProgressReporter,
) -> Harvest
where
    S: BrowserSession,
    E: RecordExtractor,
{
    let total = candidates.len();
    let mut produced: HashSet<String> = HashSet::new();
    let mut harvest = Harvest::default();

    info!(total, "extracting records");

    for (i, candidate) in candidates.iter().enumerate() {
        let id = candidate.identifier.as_str();

        if produced.contains(id) {
            debug!(identifier = id, "already extracted, skipping");
            harvest.skip(id, SkipReason::Duplicate);
        } else {
            match fetch(session, extractor, candidate).await {
                Ok(Some(mut record)) => {
                    if record.da_number.is_empty() {
                        record.da_number = candidate.identifier.clone();
                    }
                    if record.detail_url.is_empty() {
                        record.detail_url = candidate.detail_url.clone();
                    }
                    // The page's own number can differ from the listing's.
                    if produced.contains(&record.da_number) {
                        debug!(
                            identifier = id,
                            da_number = %record.da_number,
                            "page number already extracted, skipping"
                        );
                        harvest.skip(id, SkipReason::Duplicate);
                    } else {
                        produced.insert(candidate.identifier.clone());
                        produced.insert(record.da_number.clone());
                        harvest.records.push(record);
                    }
                }
                Ok(None) => {
                    warn!(identifier = id, url = %candidate.detail_url, "no detail content");
                    harvest.skip(id, SkipReason::Empty);
                }
                Err(e) => {
                    warn!(
                        identifier = id,
                        url = %candidate.detail_url,
                        error = %e,
                        "detail page failed"
                    );
                    harvest.skip(id, SkipReason::Error(e.to_string()));
                }
            }
        }

        progress.record_processed(id, i + 1, total);
    }

    info!(
        records = harvest.records.len(),
        duplicates = harvest.duplicates(),
        empty = harvest.empty(),
        errors = harvest.errors(),
        "extraction finished"
    );
    harvest
}

async fn fetch<S, E>(
    session: &mut S,
    extractor: &E,
    candidate: &Candidate,
) -> Result<Option<Record>>
where
    S: BrowserSession,
    E: RecordExtractor,
{
    let mut document = session.navigate(&candidate.detail_url).await?;

    match session.expand_all().await {
        Ok(true) => document = session.current_document().await?,
        Ok(false) => {}
        Err(e) => debug!(identifier = %candidate.identifier, error = %e, "expand-all failed"),
    }

    let url = session.current_url().await?;
    Ok(extractor.extract(&document, &url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datrack_detail::DetailExtractor;
    use datrack_shared::{DatrackError, SilentProgress};
    use std::collections::HashMap;

    /// Serves canned documents by URL. URLs missing from the map fail to load.
    #[derive(Default)]
    struct FakeBrowser {
        pages: HashMap<String, String>,
        expanded: HashMap<String, String>,
        current: String,
        visits: Vec<String>,
    }

    impl FakeBrowser {
        fn page(mut self, url: &str, document: &str) -> Self {
            self.pages.insert(url.into(), document.into());
            self
        }
    }

    impl BrowserSession for FakeBrowser {
        async fn navigate(&mut self, url: &str) -> Result<String> {
            self.visits.push(url.into());
            let doc = self
                .pages
                .get(url)
                .cloned()
                .ok_or_else(|| DatrackError::Browser(format!("timeout loading {url}")))?;
            self.current = url.into();
            Ok(doc)
        }

        async fn current_document(&mut self) -> Result<String> {
            Ok(self
                .expanded
                .get(&self.current)
                .or_else(|| self.pages.get(&self.current))
                .cloned()
                .unwrap_or_default())
        }

        async fn current_url(&mut self) -> Result<String> {
            Ok(self.current.clone())
        }

        async fn expand_all(&mut self) -> Result<bool> {
            Ok(self.expanded.contains_key(&self.current))
        }
    }

    /// Reads `id=...;desc=...` bodies; anything else is not a detail page.
    struct LineExtractor;

    impl RecordExtractor for LineExtractor {
        fn extract(&self, document: &str, current_url: &str) -> Option<Record> {
            let mut record = Record::default();
            let mut any = false;
            for part in document.split(';') {
                match part.split_once('=') {
                    Some(("id", v)) => record.da_number = v.into(),
                    Some(("desc", v)) => record.description = v.into(),
                    _ => continue,
                }
                any = true;
            }
            any.then(|| Record {
                detail_url: current_url.into(),
                ..record
            })
        }
    }

    fn candidates(n: usize) -> Vec<Candidate> {
        (1..=n)
            .map(|i| Candidate::new(format!("DA{i}/2025"), format!("https://host/d/{i}")))
            .collect()
    }

    fn browser_for(cands: &[Candidate]) -> FakeBrowser {
        cands.iter().fold(FakeBrowser::default(), |b, c| {
            b.page(&c.detail_url, &format!("id={};desc=x", c.identifier))
        })
    }

    fn ids(harvest: &Harvest) -> Vec<&str> {
        harvest.records.iter().map(|r| r.da_number.as_str()).collect()
    }

    #[tokio::test]
    async fn failure_mid_run_keeps_going() {
        let cands = candidates(5);
        let mut browser = browser_for(&cands);
        browser.pages.remove("https://host/d/3");

        let harvest = run(&mut browser, &LineExtractor, &cands, &SilentProgress).await;

        assert_eq!(ids(&harvest), ["DA1/2025", "DA2/2025", "DA4/2025", "DA5/2025"]);
        assert_eq!(harvest.errors(), 1);
        assert_eq!(harvest.skipped[0].identifier, "DA3/2025");
        assert!(matches!(
            &harvest.skipped[0].reason,
            SkipReason::Error(m) if m.contains("timeout")
        ));
        assert_eq!(browser.visits.len(), 5);
    }

    #[tokio::test]
    async fn repeated_identifier_is_extracted_once() {
        let mut cands = candidates(2);
        cands.push(Candidate::new("DA1/2025", "https://host/d/1"));
        let mut browser = browser_for(&cands);

        let harvest = run(&mut browser, &LineExtractor, &cands, &SilentProgress).await;

        assert_eq!(ids(&harvest), ["DA1/2025", "DA2/2025"]);
        assert_eq!(harvest.duplicates(), 1);
        assert_eq!(browser.visits.len(), 2);
    }

    #[tokio::test]
    async fn record_number_already_exported_is_dropped() {
        let cands = vec![
            Candidate::new("DA1/2025", "https://host/d/1"),
            Candidate::new("MA2/2025", "https://host/d/2"),
        ];
        let mut browser = FakeBrowser::default()
            .page(
                "https://host/d/1",
                r#"<h1>DA1/2025</h1><div id="lblDetails">Description: Shed</div>"#,
            )
            .page(
                "https://host/d/2",
                r#"<p>Modifies DA1/2025</p><h1>MA2/2025</h1><div id="lblDetails">Description: Deck</div>"#,
            );

        let harvest = run(&mut browser, &DetailExtractor::new(), &cands, &SilentProgress).await;

        assert_eq!(ids(&harvest), ["DA1/2025"]);
        assert_eq!(harvest.records[0].description, "Shed");
        assert_eq!(harvest.duplicates(), 1);
        assert_eq!(harvest.skipped[0].identifier, "MA2/2025");
    }

    #[tokio::test]
    async fn empty_page_is_skipped() {
        let cands = candidates(2);
        let mut browser = browser_for(&cands).page("https://host/d/2", "session expired");

        let harvest = run(&mut browser, &LineExtractor, &cands, &SilentProgress).await;

        assert_eq!(ids(&harvest), ["DA1/2025"]);
        assert_eq!(harvest.empty(), 1);
        assert_eq!(harvest.skipped[0].reason, SkipReason::Empty);
    }

    #[tokio::test]
    async fn missing_fields_backfilled_from_candidate() {
        let cands = vec![Candidate::new("PCD25/0042", "https://host/d/42")];
        let mut browser = FakeBrowser::default().page("https://host/d/42", "desc=Shed");

        let harvest = run(&mut browser, &LineExtractor, &cands, &SilentProgress).await;

        let record = &harvest.records[0];
        assert_eq!(record.da_number, "PCD25/0042");
        assert_eq!(record.detail_url, "https://host/d/42");
        assert_eq!(record.description, "Shed");
    }

    #[tokio::test]
    async fn expanded_document_is_used() {
        let cands = candidates(1);
        let mut browser = browser_for(&cands);
        browser
            .expanded
            .insert("https://host/d/1".into(), "id=DA1/2025;desc=expanded".into());

        let harvest = run(&mut browser, &LineExtractor, &cands, &SilentProgress).await;

        assert_eq!(harvest.records[0].description, "expanded");
    }

    #[tokio::test]
    async fn no_candidates_no_records() {
        let mut browser = FakeBrowser::default();
        let harvest = run(&mut browser, &LineExtractor, &[], &SilentProgress).await;
        assert!(harvest.records.is_empty());
        assert!(harvest.skipped.is_empty());
    }
}
