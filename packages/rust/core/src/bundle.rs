//! Fixed-size bundling of same-company leads.
//!
//! Bundle numbers are a pure function of each company's occurrence count in
//! arrival order, so re-running the same sequence always assigns the same
//! numbers. State lives only for the duration of one dataset run.

use std::collections::HashMap;

/// Maximum leads per bundle.
pub const BUNDLE_SIZE: u64 = 50;

/// Per-company occurrence counter. Owned exclusively by the dataset
/// processor for one run; never persisted.
#[derive(Debug, Default)]
pub struct BundleAssigner {
    counts: HashMap<String, u64>,
}

impl BundleAssigner {
    /// Create an empty assigner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `company` and return its bundle number.
    ///
    /// Company names are compared case-sensitively, exactly as they appear
    /// in the data. Unresolved companies are passed in under their shared
    /// sentinel name and therefore share a single counter.
    pub fn assign(&mut self, company: &str) -> u64 {
        let count = self.counts.entry(company.to_string()).or_insert(0);
        *count += 1;
        (*count - 1) / BUNDLE_SIZE + 1
    }
}
