//! Core domain types for lead-list enrichment runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the classification label column appended to the output CSV.
pub const CLASSIFICATION_COLUMN: &str = "Limpio";

/// Name of the bundle number column appended to the output CSV.
pub const BUNDLE_COLUMN: &str = "Bundle";

/// Name of the provider lookup column appended to the output CSV.
pub const PROVIDER_COLUMN: &str = "MX Result";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for dataset run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ProviderResult
// ---------------------------------------------------------------------------

/// Outcome of the email-provider lookup for a single lead.
///
/// The enum covers both genuine lookup answers (Gmail/Outlook/Other) and the
/// sentinel values written when no lookup could be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderResult {
    /// MX records point at Google Workspace / Gmail.
    Gmail,
    /// MX records point at Microsoft 365 / Outlook. Takes precedence over
    /// Gmail when a domain matches both families.
    Outlook,
    /// MX records exist but match neither family.
    Other,
    /// The domain resolves but publishes no MX records.
    NoMxRecords,
    /// The email value contained no `@` separator.
    InvalidEmail,
    /// The row had no email field, or it was empty.
    NoEmail,
    /// Both the primary and fallback lookups failed.
    Error,
}

impl ProviderResult {
    /// The string written into the output CSV's provider column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "Gmail",
            Self::Outlook => "Outlook",
            Self::Other => "Other",
            Self::NoMxRecords => "No MX Records",
            Self::InvalidEmail => "Invalid Email",
            Self::NoEmail => "No Email",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ProviderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Result of a successfully completed dataset run.
///
/// This is the success arm of the task outcome; the failure arm is a
/// [`crate::LeadscrubError`] carrying the terminal error description.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier, for log correlation.
    pub run_id: RunId,
    /// Human-readable completion message.
    pub message: String,
    /// Public, shareable link to the uploaded artifact.
    pub artifact_link: String,
    /// Display filename the artifact was uploaded under.
    pub file_name: String,
    /// Number of rows written to the output table.
    pub rows_processed: usize,
    /// Number of malformed rows skipped.
    pub rows_skipped: usize,
    /// Total elapsed time for the run.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_display_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed = RunId(Uuid::parse_str(&s).expect("parse RunId"));
        assert_eq!(id, parsed);
    }

    #[test]
    fn provider_result_csv_strings() {
        assert_eq!(ProviderResult::Gmail.as_str(), "Gmail");
        assert_eq!(ProviderResult::Outlook.as_str(), "Outlook");
        assert_eq!(ProviderResult::NoMxRecords.as_str(), "No MX Records");
        assert_eq!(ProviderResult::InvalidEmail.as_str(), "Invalid Email");
        assert_eq!(ProviderResult::NoEmail.as_str(), "No Email");
        assert_eq!(ProviderResult::Error.as_str(), "ERROR");
        assert_eq!(ProviderResult::Other.to_string(), "Other");
    }
}
