//! Email-provider classification from a domain's MX records.
//!
//! The primary path is a DNS-over-HTTPS MX query (Google resolve JSON API
//! shape, short timeout). Any primary failure, whether non-200, transport
//! error, or malformed payload, falls back to a conventional resolver
//! lookup. Only when both paths fail does a lookup degrade to
//! [`ProviderResult::Error`].

use serde::Deserialize;
use tracing::{debug, warn};
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;

use leadscrub_shared::config::LookupConfig;
use leadscrub_shared::{LeadscrubError, ProviderResult, Result};

/// User-Agent string for DoH requests.
const USER_AGENT: &str = concat!("leadscrub/", env!("CARGO_PKG_VERSION"));

/// DNS record type code for MX.
const MX_TYPE: u16 = 15;

/// DoH status code for NXDOMAIN.
const DOH_STATUS_NXDOMAIN: u32 = 3;

/// MX host fragments identifying Microsoft-hosted mail. Checked before the
/// Gmail family: Outlook wins when a domain matches both.
const OUTLOOK_MX_PATTERNS: &[&str] = &["outlook.com", "office365.com"];

/// MX host fragments identifying Google-hosted mail.
const GMAIL_MX_PATTERNS: &[&str] = &["google.com", "googlemail.com"];

// ---------------------------------------------------------------------------
// DoH response shape (Google resolve JSON API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

// ---------------------------------------------------------------------------
// MxClassifier
// ---------------------------------------------------------------------------

/// Provider classifier holding the DoH HTTP client and the fallback resolver.
pub struct MxClassifier {
    client: reqwest::Client,
    resolver: TokioAsyncResolver,
    doh_url: String,
}

impl MxClassifier {
    /// Create a classifier from the lookup configuration.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LeadscrubError::Lookup(format!("failed to build DoH client: {e}")))?;

        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

        Ok(Self {
            client,
            resolver,
            doh_url: config.doh_url.clone(),
        })
    }

    /// Swap in a custom fallback resolver (for tests against dead endpoints).
    #[cfg(test)]
    fn with_resolver(mut self, resolver: TokioAsyncResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Classify a domain's mail hosting. Never fails: exhausted lookups
    /// degrade to [`ProviderResult::Error`].
    ///
    /// Domain extraction from the email value is the caller's concern, as are
    /// the `No Email` / `Invalid Email` sentinels and inter-lookup pacing.
    pub async fn classify_domain(&self, domain: &str) -> ProviderResult {
        match self.doh_lookup(domain).await {
            Ok(hosts) => provider_from_hosts(&hosts),
            Err(e) => {
                warn!(domain, error = %e, "DoH MX lookup failed, falling back to resolver");
                match self.resolver_lookup(domain).await {
                    Ok(hosts) => provider_from_hosts(&hosts),
                    Err(e) => {
                        warn!(domain, error = %e, "fallback MX lookup failed");
                        ProviderResult::Error
                    }
                }
            }
        }
    }

    /// Primary lookup: DoH MX query. `Ok(vec![])` means the domain publishes
    /// no MX records; `Err` means the primary path itself failed.
    async fn doh_lookup(&self, domain: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.doh_url)
            .query(&[("name", domain), ("type", "MX")])
            .header("accept", "application/dns-json")
            .send()
            .await
            .map_err(|e| LeadscrubError::Lookup(format!("{domain}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadscrubError::Lookup(format!("{domain}: HTTP {status}")));
        }

        let body: DohResponse = response
            .json()
            .await
            .map_err(|e| LeadscrubError::Lookup(format!("{domain}: malformed DoH payload: {e}")))?;

        if body.status == DOH_STATUS_NXDOMAIN {
            debug!(domain, "DoH reports NXDOMAIN");
            return Ok(Vec::new());
        }

        if body.status != 0 {
            return Err(LeadscrubError::Lookup(format!(
                "{domain}: DoH status {}",
                body.status
            )));
        }

        // MX answer data is "<preference> <exchange>", e.g. "10 aspmx.l.google.com."
        let hosts = body
            .answer
            .iter()
            .filter(|a| a.record_type == MX_TYPE)
            .filter_map(|a| a.data.split_whitespace().last())
            .map(str::to_string)
            .collect();

        Ok(hosts)
    }

    /// Fallback lookup through the configured DNS resolver.
    async fn resolver_lookup(&self, domain: &str) -> Result<Vec<String>> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|mx| mx.exchange().to_utf8())
                .collect()),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(Vec::new()),
                _ => Err(LeadscrubError::Lookup(format!("{domain}: {e}"))),
            },
        }
    }
}

/// Map a set of MX hostnames to a provider. Empty set means no MX records;
/// the Outlook family is scanned before Gmail (precedence rule).
fn provider_from_hosts(hosts: &[String]) -> ProviderResult {
    if hosts.is_empty() {
        return ProviderResult::NoMxRecords;
    }

    let normalized: Vec<String> = hosts
        .iter()
        .map(|h| h.trim().trim_end_matches('.').to_lowercase())
        .collect();

    if normalized
        .iter()
        .any(|h| OUTLOOK_MX_PATTERNS.iter().any(|p| h.contains(p)))
    {
        return ProviderResult::Outlook;
    }

    if normalized
        .iter()
        .any(|h| GMAIL_MX_PATTERNS.iter().any(|p| h.contains(p)))
    {
        return ProviderResult::Gmail;
    }

    ProviderResult::Other
}
