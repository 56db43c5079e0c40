//! Result totals shown in the grid's pager ("<b>57</b> items in <b>3</b> pages").

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use datrack_shared::html::stripped_text;

/// Marker text the portal renders when a search matches nothing.
const NO_RECORDS_TEXT: &str = "No records";

static DIV_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class]").expect("div selector"));
static STRONG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("strong selector"));
static INFO_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgWrap.*rgInfoPart").expect("info class regex"));

/// Totals for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSummary {
    pub total_items: u32,
    pub total_pages: u32,
}

/// Whether the document is the portal's "no records" response.
pub fn has_no_records(document: &str) -> bool {
    document.contains(NO_RECORDS_TEXT)
}

/// Read the item and page totals from the pager info block.
///
/// Returns `None` when the block is missing or its first two `<strong>`
/// values are not integers.
pub fn parse_summary(document: &str) -> Option<ResultSummary> {
    let doc = Html::parse_document(document);

    let info = doc.select(&DIV_SEL).find(|div| {
        div.value()
            .attr("class")
            .is_some_and(|class| INFO_CLASS_RE.is_match(class))
    })?;

    let mut numbers = info
        .select(&STRONG_SEL)
        .map(|el| stripped_text(el).parse::<u32>());

    let total_items = numbers.next()?.ok()?;
    let total_pages = numbers.next()?.ok()?;

    Some(ResultSummary {
        total_items,
        total_pages,
    })
}
