//! Core domain types: candidates, records, and the search date range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DatrackError, Result};

/// Date format used by the portal's search inputs and the config file.
pub const PORTAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Replacement text written when a field only holds its "no data" sentinel.
pub const NOT_REQUIRED: &str = "Not required";

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// An application found on a results page, pending detail extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Public tracking number, e.g. `DA25/1234`.
    pub identifier: String,
    /// Absolute URL of the detail page.
    pub detail_url: String,
}

impl Candidate {
    pub fn new(identifier: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            detail_url: detail_url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One fully extracted and cleaned application, ready for export.
///
/// Every field is a plain string; absent data is `""`. The serde names are
/// the export column headers, and field order is column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "DA_Number")]
    pub da_number: String,
    #[serde(rename = "Detail_URL")]
    pub detail_url: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Submitted_Date")]
    pub submitted_date: String,
    #[serde(rename = "Decision")]
    pub decision: String,
    #[serde(rename = "Categories")]
    pub categories: String,
    #[serde(rename = "Property_Address")]
    pub property_address: String,
    #[serde(rename = "Applicant")]
    pub applicant: String,
    #[serde(rename = "Progress")]
    pub progress: String,
    #[serde(rename = "Fees")]
    pub fees: String,
    #[serde(rename = "Documents")]
    pub documents: String,
    #[serde(rename = "Contact_Council")]
    pub contact_council: String,
}

impl Record {
    /// Export column headers, in fixed order.
    pub const HEADERS: [&'static str; 12] = [
        "DA_Number",
        "Detail_URL",
        "Description",
        "Submitted_Date",
        "Decision",
        "Categories",
        "Property_Address",
        "Applicant",
        "Progress",
        "Fees",
        "Documents",
        "Contact_Council",
    ];

    /// Field values in [`Record::HEADERS`] order.
    pub fn values(&self) -> [&str; 12] {
        [
            self.da_number.as_str(),
            self.detail_url.as_str(),
            self.description.as_str(),
            self.submitted_date.as_str(),
            self.decision.as_str(),
            self.categories.as_str(),
            self.property_address.as_str(),
            self.applicant.as_str(),
            self.progress.as_str(),
            self.fees.as_str(),
            self.documents.as_str(),
            self.contact_council.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// Inclusive lodgement date range for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(DatrackError::validation(format!(
                "end date {} precedes start date {}",
                end.format(PORTAL_DATE_FORMAT),
                start.format(PORTAL_DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from `dd/mm/yyyy` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_portal_date(start, "start")?, parse_portal_date(end, "end")?)
    }

    /// Start date as typed into the portal.
    pub fn start_text(&self) -> String {
        self.start.format(PORTAL_DATE_FORMAT).to_string()
    }

    /// End date as typed into the portal.
    pub fn end_text(&self) -> String {
        self.end.format(PORTAL_DATE_FORMAT).to_string()
    }
}

fn parse_portal_date(value: &str, which: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DatrackError::validation(format!("{which} date is not set")));
    }
    NaiveDate::parse_from_str(value, PORTAL_DATE_FORMAT).map_err(|e| {
        DatrackError::validation(format!(
            "{which} date '{value}' is not dd/mm/yyyy: {e}"
        ))
    })
}
