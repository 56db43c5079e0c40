//! Walk every results page and assemble the deduplicated candidate list.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use datrack_shared::{Advance, Candidate, ProgressReporter, SearchSession};

use crate::normalize::UrlNormalizer;
use crate::page::{ListingRow, parse_page};

// ---------------------------------------------------------------------------
// Candidate set
// ---------------------------------------------------------------------------

/// Insertion-ordered candidates, unique by identifier. First insert wins.
#[derive(Debug, Default)]
pub struct CandidateSet {
    seen: HashSet<String>,
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `identifier` has already been collected.
    pub fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    /// Add a candidate unless its identifier is already present.
    /// Returns `true` if it was added.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if !self.seen.insert(candidate.identifier.clone()) {
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    /// Add every unseen row, normalizing only the links that are kept.
    /// Returns how many were added.
    pub fn extend_rows(&mut self, rows: Vec<ListingRow>, normalizer: &UrlNormalizer) -> usize {
        let mut added = 0;
        for row in rows {
            if self.contains(&row.identifier) {
                debug!(identifier = %row.identifier, "duplicate identifier, keeping first");
                continue;
            }
            let url = normalizer.normalize(&row.raw_link);
            if self.insert(Candidate::new(row.identifier, url)) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.candidates
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// How the page walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Every page up to the reported total was processed.
    Finished,
    /// The portal offered no next-page control before the reported last page.
    NoNextPage { last_page: u32 },
    /// A page had no results grid.
    TableMissing { page: u32 },
    /// The session failed while reading or advancing a page.
    Interrupted { page: u32, reason: String },
}

impl Completion {
    /// Whether the walk stopped before the reported last page.
    pub fn is_early_stop(&self) -> bool {
        !matches!(self, Self::Finished)
    }

    /// Short label for reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::NoNextPage { .. } => "no_next_page",
            Self::TableMissing { .. } => "table_missing",
            Self::Interrupted { .. } => "interrupted",
        }
    }
}

/// Candidates gathered from the results pages, plus how the walk went.
#[derive(Debug, Clone)]
pub struct Collection {
    pub candidates: Vec<Candidate>,
    pub completion: Completion,
    /// Pages whose grid was parsed.
    pub pages_visited: u32,
    /// Eligible rows seen across all pages, duplicates included.
    pub rows_seen: usize,
}

/// Walk results pages `1..=total_pages`, starting from the page the session
/// currently shows.
///
/// Never fails: an interrupted walk returns what was collected so far, with
/// [`Completion`] saying why it stopped.
#[instrument(skip_all, fields(total_pages = total_pages))]
pub async fn collect<S: SearchSession>(
    session: &mut S,
    normalizer: &UrlNormalizer,
    total_pages: u32,
    progress: &dyn ProgressReporter,
) -> Collection {
    let mut set = CandidateSet::new();
    let mut rows_seen = 0;
    let mut pages_visited = 0;
    let mut page = 1;

    info!(total_pages, "collecting candidates");

    let completion = loop {
        if page > total_pages {
            break Completion::Finished;
        }

        let document = match session.results_document().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(page, error = %e, "could not read results page");
                break Completion::Interrupted {
                    page,
                    reason: e.to_string(),
                };
            }
        };

        let rows = match parse_page(&document) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(page, "{e}, stopping collection early");
                break Completion::TableMissing { page };
            }
        };

        pages_visited += 1;
        rows_seen += rows.len();
        let added = set.extend_rows(rows, normalizer);
        debug!(page, added, total = set.len(), "page collected");
        progress.page_collected(page, total_pages, set.len());

        if page == total_pages {
            break Completion::Finished;
        }

        match session.next_page().await {
            Ok(Advance::Advanced) => page += 1,
            Ok(Advance::NoNextPage) => {
                info!(page, total_pages, "no next-page control, ending collection");
                break Completion::NoNextPage { last_page: page };
            }
            Err(e) => {
                warn!(page, error = %e, "could not advance to next page");
                break Completion::Interrupted {
                    page: page + 1,
                    reason: e.to_string(),
                };
            }
        }
    };

    info!(
        candidates = set.len(),
        pages_visited,
        rows_seen,
        completion = completion.label(),
        "collection ended"
    );

    Collection {
        candidates: set.into_vec(),
        completion,
        pages_visited,
        rows_seen,
    }
}
