//! Results-grid page parser.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use datrack_shared::html::stripped_text;

/// The results grid.
static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table[class*='rgMasterTable']").expect("table selector"));
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("tr selector"));
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("td selector"));
/// The magnifier icon shown on rows that open a detail page.
static SHOW_BUTTON_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[src*='GridShowButton.png']").expect("show button selector")
});
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("a selector"));

/// One eligible grid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    /// Tracking number from the second cell.
    pub identifier: String,
    /// Link target as written in the page, not yet normalized.
    pub raw_link: String,
}

/// The page has no results grid at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("results table not found")]
pub struct TableMissing;

/// Extract the eligible rows of one results page, in document order.
///
/// The first row is the header. A row counts only when it carries the
/// show-detail icon, has at least two cells, and its first anchor points at a
/// real URL rather than a `javascript:` postback. Other rows are skipped.
pub fn parse_page(document: &str) -> Result<Vec<ListingRow>, TableMissing> {
    let doc = Html::parse_document(document);
    let table = doc.select(&TABLE_SEL).next().ok_or(TableMissing)?;

    let rows = table
        .select(&ROW_SEL)
        .skip(1)
        .enumerate()
        .filter_map(|(i, row)| {
            let parsed = parse_row(row);
            if parsed.is_none() {
                debug!(row = i + 1, "skipping ineligible results row");
            }
            parsed
        })
        .collect();

    Ok(rows)
}

fn parse_row(row: ElementRef<'_>) -> Option<ListingRow> {
    row.select(&SHOW_BUTTON_SEL).next()?;

    let cells: Vec<_> = row.select(&CELL_SEL).collect();
    if cells.len() < 2 {
        return None;
    }

    let raw_link = row_link(row)?;
    let identifier = stripped_text(cells[1]);

    Some(ListingRow {
        identifier,
        raw_link,
    })
}

/// `href` of the first anchor, unless it is missing or a script postback.
fn row_link(row: ElementRef<'_>) -> Option<String> {
    let anchor = row.select(&ANCHOR_SEL).next()?;
    let href = anchor.value().attr("href").unwrap_or("").trim();

    if href.is_empty() || is_script_link(href) {
        return None;
    }

    Some(href.to_string())
}

fn is_script_link(href: &str) -> bool {
    href.get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}
