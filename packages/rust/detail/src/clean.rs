//! Text rules applied to raw region content.
//!
//! Each rule is a pure `&str -> String` function.

use std::sync::LazyLock;

use regex::Regex;

use datrack_shared::NOT_REQUIRED;

/// Fees region text when nothing is payable.
pub const FEES_SENTINEL: &str = "No fees recorded against this application.";

/// Contact region text when the application is not on exhibition.
pub const CONTACT_SENTINEL: &str = "Application Is Not on exhibition, please call Council on 1300 293 111 if you require assistance.";

const DESCRIPTION_LABEL: &str = "Description:";
const SUBMITTED_LABEL: &str = "Submitted:";
const APPLICANT_LABEL: &str = "Applicant:";

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("anchor regex"));

/// Split the details block into `(description, submitted_date)`.
///
/// Without a `Description:` label the whole block is the description.
pub fn split_details(details: &str) -> (String, String) {
    if !details.contains(DESCRIPTION_LABEL) {
        return (details.to_string(), String::new());
    }

    let (before, after) = match details.split_once(SUBMITTED_LABEL) {
        Some((before, after)) => (before, after.trim()),
        None => (details, ""),
    };

    let description = before.replace(DESCRIPTION_LABEL, "").trim().to_string();
    (description, after.to_string())
}

/// Replace `<a ...>text</a>` with `text`.
pub fn strip_anchor_markup(text: &str) -> String {
    ANCHOR_RE.replace_all(text, "$1").trim().to_string()
}

/// Drop a leading `Applicant:` label.
pub fn strip_applicant_label(people: &str) -> String {
    let people = people.trim();
    people
        .strip_prefix(APPLICANT_LABEL)
        .unwrap_or(people)
        .trim()
        .to_string()
}

/// `"Not required"` if `value` trims to exactly `sentinel`, else `value` unchanged.
pub fn replace_sentinel(value: String, sentinel: &str) -> String {
    if value.trim() == sentinel {
        NOT_REQUIRED.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_and_submitted() {
        let (desc, date) = split_details("Description:Build a shed Submitted:12/01/2025");
        assert_eq!(desc, "Build a shed");
        assert_eq!(date, "12/01/2025");
    }

    #[test]
    fn description_without_submitted() {
        let (desc, date) = split_details("Description: Demolition of shed");
        assert_eq!(desc, "Demolition of shed");
        assert_eq!(date, "");
    }

    #[test]
    fn block_without_description_label_is_verbatim() {
        let (desc, date) = split_details("Pool fence Submitted:01/02/2025");
        assert_eq!(desc, "Pool fence Submitted:01/02/2025");
        assert_eq!(date, "");
    }

    #[test]
    fn empty_details() {
        assert_eq!(split_details(""), (String::new(), String::new()));
    }

    #[test]
    fn anchors_are_unwrapped() {
        assert_eq!(
            strip_anchor_markup(r#"<a href="../Prop.aspx?k=1">1 Main St, NOWRA</a>"#),
            "1 Main St, NOWRA"
        );
        assert_eq!(
            strip_anchor_markup(r#"<A HREF='x'>Lot 2</A>; <a>Lot 3</a>"#),
            "Lot 2; Lot 3"
        );
        assert_eq!(strip_anchor_markup(" 5 High St "), "5 High St");
    }

    #[test]
    fn applicant_label_only_when_leading() {
        assert_eq!(strip_applicant_label("Applicant: Jane Citizen"), "Jane Citizen");
        assert_eq!(strip_applicant_label("Applicant:Jane"), "Jane");
        assert_eq!(strip_applicant_label("Owner: Council"), "Owner: Council");
        assert_eq!(
            strip_applicant_label("Owner: A; Applicant: B"),
            "Owner: A; Applicant: B"
        );
    }

    #[test]
    fn fees_sentinel_exact_match() {
        assert_eq!(replace_sentinel(FEES_SENTINEL.into(), FEES_SENTINEL), "Not required");
        assert_eq!(
            replace_sentinel(format!("  {FEES_SENTINEL}\n"), FEES_SENTINEL),
            "Not required"
        );
    }

    #[test]
    fn fees_near_misses_are_kept() {
        for near in [
            "No fees recorded against this application",
            "No fees recorded against this application!",
            "No fees  recorded against this application.",
            "no fees recorded against this application.",
            "No fees recorded",
            "Note: No fees recorded against this application.",
        ] {
            assert_eq!(replace_sentinel(near.into(), FEES_SENTINEL), near);
        }
    }

    #[test]
    fn contact_sentinel_exact_match() {
        assert_eq!(
            replace_sentinel(CONTACT_SENTINEL.into(), CONTACT_SENTINEL),
            "Not required"
        );
        let near = CONTACT_SENTINEL.replace("1300 293 111", "1300293111");
        assert_eq!(replace_sentinel(near.clone(), CONTACT_SENTINEL), near);
        assert_eq!(
            replace_sentinel(FEES_SENTINEL.into(), CONTACT_SENTINEL),
            FEES_SENTINEL
        );
    }
}
