//! Run summary, printable and serializable to JSON.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use datrack_listing::Completion;
use datrack_shared::{DatrackError, DateRange, Record, Result};

use crate::orchestrator::{Harvest, Skip};

/// How far the run got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Still running; only seen on an unfinished report.
    Started,
    /// The search matched nothing.
    NoRecords,
    /// Results were listed but no candidate row was eligible.
    NothingCollected,
    /// Candidates were found but none produced a record.
    NothingExtracted,
    /// Records were written to the output file.
    Exported,
}

impl RunStatus {
    /// Whether an output file was written.
    pub fn wrote_output(self) -> bool {
        self == Self::Exported
    }
}

/// How many exported records have each field filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub da_numbers: usize,
    pub descriptions: usize,
    pub decisions: usize,
    pub fees: usize,
    pub contacts: usize,
}

impl DataQuality {
    pub fn measure(records: &[Record]) -> Self {
        let filled = |f: fn(&Record) -> &str| records.iter().filter(|r| !f(r).is_empty()).count();
        Self {
            da_numbers: filled(|r| r.da_number.as_str()),
            descriptions: filled(|r| r.description.as_str()),
            decisions: filled(|r| r.decision.as_str()),
            fees: filled(|r| r.fees.as_str()),
            contacts: filled(|r| r.contact_council.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub range: DateRange,

    /// Totals the portal reported under the grid.
    pub expected_items: u32,
    pub total_pages: u32,

    pub pages_visited: u32,
    pub rows_seen: usize,
    pub candidates: usize,
    /// Label of the listing walk's [`Completion`].
    pub collection: Option<String>,
    pub collection_detail: Option<String>,
    /// The listing walk stopped before the last reported page.
    pub incomplete: bool,

    pub records: usize,
    pub duplicates: usize,
    pub empty: usize,
    pub errors: usize,
    pub skipped: Vec<Skip>,
    /// `records / expected_items`; `None` when nothing was expected.
    pub success_rate: Option<f64>,
    pub quality: DataQuality,

    pub output_path: Option<PathBuf>,
}

impl RunReport {
    pub fn start(range: DateRange) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            status: RunStatus::Started,
            started_at: Utc::now(),
            finished_at: None,
            range,
            expected_items: 0,
            total_pages: 0,
            pages_visited: 0,
            rows_seen: 0,
            candidates: 0,
            collection: None,
            collection_detail: None,
            incomplete: false,
            records: 0,
            duplicates: 0,
            empty: 0,
            errors: 0,
            skipped: Vec::new(),
            success_rate: None,
            quality: DataQuality::default(),
            output_path: None,
        }
    }

    pub fn record_collection(
        &mut self,
        completion: &Completion,
        pages_visited: u32,
        rows_seen: usize,
        candidates: usize,
    ) {
        self.pages_visited = pages_visited;
        self.rows_seen = rows_seen;
        self.candidates = candidates;
        self.collection = Some(completion.label().to_string());
        self.collection_detail = completion_detail(completion);
        self.incomplete = completion.is_early_stop();
    }

    pub fn record_harvest(&mut self, harvest: &Harvest) {
        self.records = harvest.records.len();
        self.duplicates = harvest.duplicates();
        self.empty = harvest.empty();
        self.errors = harvest.errors();
        self.skipped = harvest.skipped.clone();
        self.quality = DataQuality::measure(&harvest.records);
        self.success_rate = success_rate(self.records, self.expected_items);
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DatrackError::Export(format!("report: {e}")))?;
        std::fs::write(path, json).map_err(|e| DatrackError::io(path, e))
    }
}

fn success_rate(records: usize, expected: u32) -> Option<f64> {
    (expected > 0).then(|| records as f64 / f64::from(expected))
}

fn completion_detail(completion: &Completion) -> Option<String> {
    match completion {
        Completion::Finished => None,
        Completion::NoNextPage { last_page } => {
            Some(format!("no next-page control after page {last_page}"))
        }
        Completion::TableMissing { page } => Some(format!("results table missing on page {page}")),
        Completion::Interrupted { page, reason } => Some(format!("page {page}: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::SkipReason;

    fn range() -> DateRange {
        DateRange::parse("01/09/2025", "30/09/2025").unwrap()
    }

    #[test]
    fn success_rate_guards_zero() {
        assert_eq!(success_rate(0, 0), None);
        assert_eq!(success_rate(3, 4), Some(0.75));
    }

    #[test]
    fn early_stop_marks_incomplete() {
        let mut report = RunReport::start(range());
        report.record_collection(&Completion::TableMissing { page: 3 }, 2, 40, 38);

        assert!(report.incomplete);
        assert_eq!(report.collection.as_deref(), Some("table_missing"));
        assert_eq!(
            report.collection_detail.as_deref(),
            Some("results table missing on page 3")
        );

        report.record_collection(&Completion::Finished, 3, 50, 48);
        assert!(!report.incomplete);
        assert_eq!(report.collection_detail, None);
    }

    #[test]
    fn harvest_counts_and_quality() {
        let mut report = RunReport::start(range());
        report.expected_items = 4;
        let harvest = Harvest {
            records: vec![
                Record {
                    da_number: "DA1/2025".into(),
                    fees: "Not required".into(),
                    ..Record::default()
                },
                Record {
                    da_number: "DA2/2025".into(),
                    description: "Shed".into(),
                    ..Record::default()
                },
            ],
            skipped: vec![
                Skip {
                    identifier: "DA3/2025".into(),
                    reason: SkipReason::Error("timeout".into()),
                },
                Skip {
                    identifier: "DA4/2025".into(),
                    reason: SkipReason::Empty,
                },
            ],
        };

        report.record_harvest(&harvest);

        assert_eq!(report.records, 2);
        assert_eq!((report.duplicates, report.empty, report.errors), (0, 1, 1));
        assert_eq!(report.success_rate, Some(0.5));
        assert_eq!(
            report.quality,
            DataQuality {
                da_numbers: 2,
                descriptions: 1,
                decisions: 0,
                fees: 1,
                contacts: 0,
            }
        );
    }

    #[test]
    fn serializes_to_json() {
        let mut report = RunReport::start(range());
        report.skipped.push(Skip {
            identifier: "DA9/2025".into(),
            reason: SkipReason::Duplicate,
        });
        report.finish(RunStatus::NoRecords);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "no_records");
        assert_eq!(value["skipped"][0]["reason"]["kind"], "duplicate");
        assert!(value["finished_at"].is_string());
        assert!(value["success_rate"].is_null());
    }
}
