//! Read a detail page into a [`Record`].

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use datrack_shared::Record;
use datrack_shared::html::stripped_text;

use crate::clean::{
    CONTACT_SENTINEL, FEES_SENTINEL, replace_sentinel, split_details, strip_anchor_markup,
    strip_applicant_label,
};

/// Tracking numbers: `PCD`, `RA`, `RS`, `DA` or `MA`, digits, `/`, year.
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(PCD\d+/\d+|RA\d+/\d+|RS\d+/\d+|DA\d+/\d+|MA\d+/\d+)").expect("identifier regex")
});

/// Element ids of the labelled regions on a detail page.
mod region {
    pub const DETAILS: &str = "lblDetails";
    pub const DECISION: &str = "lblDecision";
    pub const CATEGORIES: &str = "lblCat";
    pub const PROPERTIES: &str = "lblProp";
    pub const PEOPLE: &str = "lblPeople";
    pub const PROGRESS: &str = "lblProg";
    pub const FEES: &str = "lblFees";
    pub const DOCUMENTS: &str = "lblDocs";
    pub const CONTACT: &str = "lbl91";

    pub const ALL: [&str; 9] = [
        DETAILS, DECISION, CATEGORIES, PROPERTIES, PEOPLE, PROGRESS, FEES, DOCUMENTS, CONTACT,
    ];
}

/// Turns one rendered detail document into a record.
///
/// `None` means the document could not be read as a detail page; callers
/// treat it as a skippable miss.
pub trait RecordExtractor {
    fn extract(&self, document: &str, current_url: &str) -> Option<Record>;
}

/// Extractor for the ApplicationMaster detail layout.
pub struct DetailExtractor {
    /// One `div#id` selector per region, in [`region::ALL`] order.
    selectors: Vec<Selector>,
}

impl DetailExtractor {
    pub fn new() -> Self {
        let selectors = region::ALL
            .iter()
            .map(|id| Selector::parse(&format!("div#{id}")).expect("region selector"))
            .collect();
        Self { selectors }
    }
}

impl Default for DetailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor for DetailExtractor {
    fn extract(&self, document: &str, current_url: &str) -> Option<Record> {
        let doc = Html::parse_document(document);

        // None per region that is absent from the page.
        let regions: Vec<Option<String>> = self
            .selectors
            .iter()
            .map(|sel| doc.select(sel).next().map(stripped_text))
            .collect();

        if regions.iter().all(Option::is_none) {
            debug!(url = current_url, "no detail regions on page");
            return None;
        }

        let [
            details,
            decision,
            categories,
            properties,
            people,
            progress,
            fees,
            documents,
            contact,
        ]: [String; 9] = regions
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .try_into()
            .ok()?;

        let da_number = IDENTIFIER_RE
            .find(document)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let (description, submitted_date) = split_details(&details);

        Some(Record {
            da_number,
            detail_url: current_url.trim().to_string(),
            description,
            submitted_date,
            decision,
            categories,
            property_address: strip_anchor_markup(&properties),
            applicant: strip_applicant_label(&people),
            progress,
            fees: replace_sentinel(fees, FEES_SENTINEL),
            documents,
            contact_council: replace_sentinel(contact, CONTACT_SENTINEL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    const URL: &str = "https://host/app/default.aspx?page=wrapper&key=1001";

    #[test]
    fn full_detail_page() {
        let record = DetailExtractor::new()
            .extract(&load_fixture("detail_full.html"), URL)
            .expect("record");

        assert_eq!(record.da_number, "DA25/1001");
        assert_eq!(record.detail_url, URL);
        assert_eq!(
            record.description,
            "Dwelling alterations and additions including new deck"
        );
        assert_eq!(record.submitted_date, "02/09/2025");
        assert_eq!(record.decision, "Approved under delegated authority 20/09/2025");
        assert_eq!(record.categories, "Residential - Alterations & additions");
        assert_eq!(
            record.property_address,
            "12 Kangaroo Valley Road, BERRY  NSW  2535"
        );
        assert_eq!(record.applicant, "Zoë Ngô");
        assert_eq!(record.fees, "Application fee $1,254.00");
        assert_eq!(record.documents, "Notice of Determination");
        assert_eq!(record.contact_council, "Exhibition period 05/09/2025 to 19/09/2025");
    }

    #[test]
    fn placeholder_page_is_cleaned() {
        let record = DetailExtractor::new()
            .extract(&load_fixture("detail_placeholders.html"), URL)
            .expect("record");

        assert_eq!(record.da_number, "");
        assert_eq!(record.description, "Demolition of shed");
        assert_eq!(record.submitted_date, "");
        assert_eq!(record.decision, "");
        assert_eq!(record.categories, "");
        assert_eq!(record.property_address, "");
        assert_eq!(record.applicant, "Owner: Council");
        assert_eq!(record.fees, "Not required");
        assert_eq!(record.contact_council, "Not required");
    }

    #[test]
    fn identifier_prefixes() {
        let extractor = DetailExtractor::new();
        for id in ["PCD25/0042", "RA24/0003", "RS25/0100", "DA25/1", "MA23/0007"] {
            let html = format!(
                r#"<html><body><h1>Application {id}</h1><div id="lblDetails">x</div></body></html>"#
            );
            let record = extractor.extract(&html, URL).expect("record");
            assert_eq!(record.da_number, id);
        }

        let html = r#"<html><body><h1>Application CC25/1</h1><div id="lblDetails">x</div></body></html>"#;
        assert_eq!(extractor.extract(html, URL).unwrap().da_number, "");
    }

    #[test]
    fn page_without_regions_yields_none() {
        let html = "<html><body><h1>Your session has expired</h1></body></html>";
        assert!(DetailExtractor::new().extract(html, URL).is_none());
    }

    #[test]
    fn literal_anchor_text_in_property_region() {
        let html = r#"<div id="lblProp">&lt;a href="p.aspx"&gt;3 Beach Rd, HUSKISSON&lt;/a&gt;</div>"#;
        let record = DetailExtractor::new().extract(html, URL).unwrap();
        assert_eq!(record.property_address, "3 Beach Rd, HUSKISSON");
    }
}
