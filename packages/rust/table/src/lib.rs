//! In-memory CSV dataset model for lead lists.
//!
//! The whole input file is parsed up front into a [`Dataset`] (header +
//! rows); processing is strictly sequential over the parsed rows, so there
//! is no streaming reader to manage.

pub mod columns;
pub mod output;

use leadscrub_shared::{LeadscrubError, Result};
use tracing::warn;

pub use columns::{LogicalField, UNKNOWN_COMPANY, UNKNOWN_POSITION};
pub use output::OutputTable;

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// A parsed lead list: one fixed header plus every data row, in file order.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column names as they appeared in the source header, order-preserving.
    pub headers: Vec<String>,
    /// Data rows in arrival order.
    pub rows: Vec<Row>,
}

/// One raw CSV row, positionally aligned with the dataset header.
///
/// A row may carry fewer values than the header (missing trailing cells read
/// as empty) but never usefully more: extra unnamed values make the row
/// structurally malformed.
#[derive(Debug, Clone)]
pub struct Row {
    /// Zero-based data row index (header excluded).
    pub index: usize,
    /// Cell values in header order.
    pub values: Vec<String>,
}

impl Row {
    /// Whether this row maps cleanly onto the given header.
    pub fn is_well_formed(&self, header_count: usize) -> bool {
        self.values.len() <= header_count
    }
}

impl Dataset {
    /// Parse a complete UTF-8 CSV payload.
    ///
    /// Fails with an input error when no header row is present. Rows the CSV
    /// reader itself cannot decode are logged and dropped; structural
    /// validation against the header happens later, per row, in the pipeline.
    pub fn parse(csv_data: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| LeadscrubError::input(format!("failed to read CSV headers: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() {
            return Err(LeadscrubError::input("CSV data is missing headers"));
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            match record {
                Ok(record) => rows.push(Row {
                    index,
                    values: record.iter().map(str::to_string).collect(),
                }),
                Err(e) => {
                    warn!(row = index + 1, error = %e, "unreadable CSV record, dropping");
                }
            }
        }

        Ok(Self { headers, rows })
    }

    /// Look up a cell by column name. Missing trailing cells read as `None`.
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| row.values.get(i))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_csv() {
        let data = "Company Name,Title,Email\nAcme,CEO,ceo@acme.com\nAcme,CTO,cto@acme.com";
        let dataset = Dataset::parse(data).unwrap();

        assert_eq!(dataset.headers, vec!["Company Name", "Title", "Email"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.value(&dataset.rows[0], "Title"), Some("CEO"));
        assert_eq!(dataset.value(&dataset.rows[1], "Email"), Some("cto@acme.com"));
    }

    #[test]
    fn empty_payload_is_missing_headers() {
        let err = Dataset::parse("").unwrap_err();
        assert!(err.to_string().contains("missing headers"));
    }

    #[test]
    fn short_rows_read_as_empty() {
        let data = "Company Name,Title,Email\nAcme,CEO";
        let dataset = Dataset::parse(data).unwrap();

        assert_eq!(dataset.rows.len(), 1);
        assert!(dataset.rows[0].is_well_formed(dataset.headers.len()));
        assert_eq!(dataset.value(&dataset.rows[0], "Email"), None);
    }

    #[test]
    fn oversized_rows_are_malformed() {
        let data = "Company Name,Title\nAcme,CEO,extra,cells";
        let dataset = Dataset::parse(data).unwrap();

        assert_eq!(dataset.rows.len(), 1);
        assert!(!dataset.rows[0].is_well_formed(dataset.headers.len()));
    }

    #[test]
    fn parse_fixture() {
        let data = std::fs::read_to_string("../../../fixtures/csv/leads.fixture.csv")
            .expect("read leads fixture");
        let dataset = Dataset::parse(&data).expect("parse fixture");

        assert_eq!(dataset.headers.len(), 4);
        assert_eq!(dataset.rows.len(), 3);
        assert_eq!(dataset.value(&dataset.rows[0], "Company Name"), Some("Acme Corp"));
    }
}
