//! Augmented output table, materialized in full before upload.

use leadscrub_shared::{
    BUNDLE_COLUMN, CLASSIFICATION_COLUMN, LeadscrubError, PROVIDER_COLUMN, Result,
};

/// The accumulated output table: input header plus the three derived columns,
/// one record per well-formed input row.
#[derive(Debug, Clone)]
pub struct OutputTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl OutputTable {
    /// Build the output header from the input header: the derived columns are
    /// always appended in the fixed order `Limpio`, `Bundle`, `MX Result`.
    pub fn new(input_headers: &[String]) -> Self {
        let mut headers = input_headers.to_vec();
        headers.push(CLASSIFICATION_COLUMN.to_string());
        headers.push(BUNDLE_COLUMN.to_string());
        headers.push(PROVIDER_COLUMN.to_string());
        Self {
            headers,
            records: Vec::new(),
        }
    }

    /// Append a completed record. Callers are expected to pass records
    /// already aligned with [`Self::headers`].
    pub fn push(&mut self, record: Vec<String>) {
        debug_assert_eq!(record.len(), self.headers.len());
        self.records.push(record);
    }

    /// The output header, input order preserved.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Accumulated records, arrival order preserved.
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Number of accumulated records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the whole table to CSV bytes.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.headers)
            .map_err(|e| LeadscrubError::input(format!("failed to serialize header: {e}")))?;

        for record in &self.records {
            writer
                .write_record(record)
                .map_err(|e| LeadscrubError::input(format!("failed to serialize record: {e}")))?;
        }

        writer
            .into_inner()
            .map_err(|e| LeadscrubError::input(format!("failed to flush output table: {e}")))
    }
}
