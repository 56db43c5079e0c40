//! Small HTML text helpers shared by the listing and detail parsers.

use scraper::ElementRef;

/// Text content of `el` with each text node trimmed and empty nodes dropped,
/// joined without a separator.
pub fn stripped_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
