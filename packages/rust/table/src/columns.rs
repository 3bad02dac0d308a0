//! Heuristic column resolution for semantically-named lead fields.
//!
//! Lead lists arrive with unpredictable header spellings ("Title",
//! "Organization Name", "EMAIL"), so logical fields are located by a fixed
//! ranked pattern list instead of fixed positions. Matching is
//! case-insensitive and anchored at the start of the header name; the first
//! matching header in header order wins, with no attempt to disambiguate
//! further matches.

use std::sync::LazyLock;

use regex::Regex;

use crate::Row;

/// Default value when no title column resolves for a row.
pub const UNKNOWN_POSITION: &str = "Unknown Position";

/// Default value when no company column resolves for a row.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Logical fields the pipeline needs out of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    Title,
    Company,
    Email,
}

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^title").expect("valid title pattern"));

static COMPANY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:organization name|company name|company|organization)")
        .expect("valid company pattern")
});

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^e-?mail").expect("valid email pattern"));

impl LogicalField {
    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Title => &TITLE_PATTERN,
            Self::Company => &COMPANY_PATTERN,
            Self::Email => &EMAIL_PATTERN,
        }
    }
}

/// Find the first header matching the field's pattern, returning its index
/// and name. Side-effect-free; does not assume any column order.
pub fn resolve<'a>(headers: &'a [String], field: LogicalField) -> Option<(usize, &'a str)> {
    let pattern = field.pattern();
    headers
        .iter()
        .enumerate()
        .find(|(_, h)| pattern.is_match(h))
        .map(|(i, h)| (i, h.as_str()))
}

/// Resolve a field to the row's cell value. `None` when the column is absent
/// or the row has no cell at that position.
pub fn resolve_value<'a>(headers: &[String], row: &'a Row, field: LogicalField) -> Option<&'a str> {
    let (index, _) = resolve(headers, field)?;
    row.values.get(index).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_standard_headers() {
        let h = headers(&["Company Name", "Title", "Email"]);
        assert_eq!(resolve(&h, LogicalField::Company), Some((0, "Company Name")));
        assert_eq!(resolve(&h, LogicalField::Title), Some((1, "Title")));
        assert_eq!(resolve(&h, LogicalField::Email), Some((2, "Email")));
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let h = headers(&["COMPANY NAME", "title", "E-Mail"]);
        assert_eq!(resolve(&h, LogicalField::Company), Some((0, "COMPANY NAME")));
        assert_eq!(resolve(&h, LogicalField::Title), Some((1, "title")));
        assert_eq!(resolve(&h, LogicalField::Email), Some((2, "E-Mail")));
    }

    #[test]
    fn organization_variants_resolve_as_company() {
        let h = headers(&["Organization", "Title"]);
        assert_eq!(resolve(&h, LogicalField::Company), Some((0, "Organization")));

        let h = headers(&["Organization Name", "Title"]);
        assert_eq!(resolve(&h, LogicalField::Company), Some((0, "Organization Name")));
    }

    #[test]
    fn first_header_order_match_wins() {
        let h = headers(&["Company", "Company Name"]);
        assert_eq!(resolve(&h, LogicalField::Company), Some((0, "Company")));
    }

    #[test]
    fn matching_is_anchored_at_start() {
        // "Job Title" does not start with "title", so it does not resolve.
        let h = headers(&["Job Title", "Company"]);
        assert_eq!(resolve(&h, LogicalField::Title), None);
    }

    #[test]
    fn resolve_value_reads_the_cell() {
        let h = headers(&["Company Name", "Title", "Email"]);
        let row = Row {
            index: 0,
            values: vec!["Acme".into(), "CEO".into(), "ceo@acme.com".into()],
        };
        assert_eq!(resolve_value(&h, &row, LogicalField::Title), Some("CEO"));
        assert_eq!(resolve_value(&h, &row, LogicalField::Email), Some("ceo@acme.com"));
    }

    #[test]
    fn resolve_value_none_for_short_row() {
        let h = headers(&["Company Name", "Title", "Email"]);
        let row = Row {
            index: 0,
            values: vec!["Acme".into()],
        };
        assert_eq!(resolve_value(&h, &row, LogicalField::Email), None);
    }
}
