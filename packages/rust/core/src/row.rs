//! Per-row enrichment pipeline.
//!
//! One row flows through: structural validation → company resolution →
//! bundle assignment → email resolution → provider classification → lead
//! classification → augmented output record. The transformation is total
//! over well-formed rows and skips malformed ones with a log line.

use std::time::Duration;

use tracing::{debug, warn};

use leadscrub_classifier::LeadClassifier;
use leadscrub_mx::MxClassifier;
use leadscrub_shared::ProviderResult;
use leadscrub_table::columns::{self, LogicalField, UNKNOWN_COMPANY};
use leadscrub_table::Row;

use crate::bundle::BundleAssigner;

/// Row pipeline over one dataset's fixed header. Field references are
/// re-resolved for every row rather than hoisted to the dataset.
pub struct RowPipeline<'a> {
    /// The dataset's header, fixed for the run.
    pub headers: &'a [String],
    /// Provider classifier.
    pub mx: &'a MxClassifier,
    /// Lead classifier.
    pub classifier: &'a LeadClassifier,
    /// Prompt template, constant for the run.
    pub prompt_template: &'a str,
    /// Pause inserted before each MX lookup (upstream throttling guard).
    pub lookup_delay: Duration,
}

impl RowPipeline<'_> {
    /// Process one row into its augmented output record, or `None` when the
    /// row fails structural validation.
    pub async fn process(&self, row: &Row, bundles: &mut BundleAssigner) -> Option<Vec<String>> {
        if !row.is_well_formed(self.headers.len()) {
            warn!(
                row = row.index + 1,
                cells = row.values.len(),
                columns = self.headers.len(),
                "malformed row, skipping"
            );
            return None;
        }

        let company = columns::resolve_value(self.headers, row, LogicalField::Company)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COMPANY);

        let bundle = bundles.assign(company);
        let provider = self.classify_provider(row, company).await;
        let label = self
            .classifier
            .classify(self.headers, row, self.prompt_template)
            .await;

        debug!(
            row = row.index + 1,
            company,
            bundle,
            provider = %provider,
            label,
            "row enriched"
        );

        // Pad short rows so the derived columns land under their headers.
        let mut record = row.values.clone();
        record.resize(self.headers.len(), String::new());
        record.push(label);
        record.push(bundle.to_string());
        record.push(provider.as_str().to_string());
        Some(record)
    }

    /// Resolve the email field and classify its domain's mail hosting.
    /// Sentinels short-circuit without touching the network.
    async fn classify_provider(&self, row: &Row, company: &str) -> ProviderResult {
        let email = columns::resolve_value(self.headers, row, LogicalField::Email)
            .map(str::trim)
            .filter(|e| !e.is_empty());

        let Some(email) = email else {
            return ProviderResult::NoEmail;
        };

        let Some(domain) = domain_of(email) else {
            warn!(row = row.index + 1, company, email, "email has no valid domain");
            return ProviderResult::InvalidEmail;
        };

        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }

        self.mx.classify_domain(domain).await
    }
}

/// Extract the domain from an email value. `None` when there is no `@` or
/// nothing follows it.
fn domain_of(email: &str) -> Option<&str> {
    let (_, domain) = email.split_once('@')?;
    (!domain.is_empty()).then_some(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    use leadscrub_shared::config::{ClassifierConfig, LookupConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn domain_extraction() {
        assert_eq!(domain_of("ceo@acme.com"), Some("acme.com"));
        assert_eq!(domain_of("no-at-sign"), None);
        assert_eq!(domain_of("trailing@"), None);
        assert_eq!(domain_of("a@b@c.com"), Some("b@c.com"));
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    async fn llm_mock(server: &MockServer, label: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": label }, "finish_reason": "stop" }]
            })))
            .mount(server)
            .await;
    }

    fn classifier(base_url: String) -> LeadClassifier {
        LeadClassifier::new(ClassifierConfig {
            base_url,
            api_key: "test-key".into(),
            model: "openai/gpt-4o-mini".into(),
            max_attempts: 3,
            retry_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(2),
            max_output_tokens: 8,
        })
        .unwrap()
    }

    fn mx(doh_url: String) -> MxClassifier {
        MxClassifier::new(&LookupConfig {
            doh_url,
            timeout: Duration::from_secs(2),
            delay: Duration::ZERO,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn malformed_row_is_skipped() {
        let server = MockServer::start().await;
        llm_mock(&server, "Si").await;

        let h = headers(&["Company Name", "Title"]);
        let pipeline = RowPipeline {
            headers: &h,
            mx: &mx(format!("{}/resolve", server.uri())),
            classifier: &classifier(server.uri()),
            prompt_template: "[POSICION]?",
            lookup_delay: Duration::ZERO,
        };

        let row = Row {
            index: 0,
            values: vec!["Acme".into(), "CEO".into(), "extra".into()],
        };
        let mut bundles = BundleAssigner::new();

        assert!(pipeline.process(&row, &mut bundles).await.is_none());
    }

    #[tokio::test]
    async fn sentinel_providers_skip_the_lookup() {
        let server = MockServer::start().await;
        llm_mock(&server, "Si").await;

        // DoH endpoint that would fail loudly if ever called.
        Mock::given(method("GET"))
            .and(path("/resolve"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let h = headers(&["Company Name", "Title", "Email"]);
        let pipeline = RowPipeline {
            headers: &h,
            mx: &mx(format!("{}/resolve", server.uri())),
            classifier: &classifier(server.uri()),
            prompt_template: "[POSICION]?",
            lookup_delay: Duration::ZERO,
        };
        let mut bundles = BundleAssigner::new();

        let no_email = Row {
            index: 0,
            values: vec!["Acme".into(), "CEO".into(), "".into()],
        };
        let record = pipeline.process(&no_email, &mut bundles).await.unwrap();
        assert_eq!(record, vec!["Acme", "CEO", "", "Si", "1", "No Email"]);

        let invalid = Row {
            index: 1,
            values: vec!["Acme".into(), "CTO".into(), "not-an-email".into()],
        };
        let record = pipeline.process(&invalid, &mut bundles).await.unwrap();
        assert_eq!(record, vec!["Acme", "CTO", "not-an-email", "Si", "1", "Invalid Email"]);
    }

    #[tokio::test]
    async fn unresolved_company_uses_shared_sentinel_counter() {
        let server = MockServer::start().await;
        llm_mock(&server, "Si").await;

        let h = headers(&["Nombre", "Title"]);
        let pipeline = RowPipeline {
            headers: &h,
            mx: &mx(format!("{}/resolve", server.uri())),
            classifier: &classifier(server.uri()),
            prompt_template: "[POSICION]?",
            lookup_delay: Duration::ZERO,
        };
        let mut bundles = BundleAssigner::new();

        let row_a = Row {
            index: 0,
            values: vec!["whatever".into(), "CEO".into()],
        };
        let row_b = Row {
            index: 1,
            values: vec!["something else".into(), "CTO".into()],
        };

        pipeline.process(&row_a, &mut bundles).await.unwrap();
        pipeline.process(&row_b, &mut bundles).await.unwrap();

        // Both rows fed the same sentinel counter: 48 more occurrences fill
        // bundle 1, so the 51st overall lands in bundle 2.
        for _ in 0..48 {
            assert_eq!(bundles.assign(UNKNOWN_COMPANY), 1);
        }
        assert_eq!(bundles.assign(UNKNOWN_COMPANY), 2);
    }
}
