//! LLM lead classification with a bounded retry budget.
//!
//! Each row's resolved title is substituted into the run's prompt template
//! and sent as a chat-completions request expecting a very short label in
//! return. Call outcomes are folded into [`ClassificationOutcome`] and the
//! retry loop branches on the tag rather than on transport error types, so
//! retry policy stays independent of the HTTP client's error hierarchy.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use leadscrub_shared::config::ClassifierConfig;
use leadscrub_shared::{LeadscrubError, Result};
use leadscrub_table::columns::{self, LogicalField, UNKNOWN_POSITION};
use leadscrub_table::Row;

/// Placeholder token replaced with the row's resolved title.
///
/// Canonical token; the legacy `{{1.col6}}` spelling is not honored.
pub const TITLE_PLACEHOLDER: &str = "[POSICION]";

/// Label written when classification failed permanently for a row.
pub const ERROR_LABEL: &str = "Error";

/// Label written when the model returned an empty or unparseable response.
pub const NO_CONTENT_LABEL: &str = "No Content";

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Classified outcome of a single LLM call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    /// The model returned usable text.
    Success(String),
    /// The provider refused to answer; carries the refusal reason.
    Blocked(String),
    /// The response carried no content worth keeping.
    Empty,
    /// Timeout, rate limit, or transient server failure; worth retrying.
    RetryableFailure(String),
    /// Credential/permission failure; retrying cannot help.
    FatalFailure(String),
}

// ---------------------------------------------------------------------------
// Wire types (chat-completions shape)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// LeadClassifier
// ---------------------------------------------------------------------------

/// Chat-completions client plus retry policy for per-row classification.
pub struct LeadClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl LeadClassifier {
    /// Create a classifier from the runtime configuration.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                LeadscrubError::Classification(format!("failed to build LLM client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Classify one row, returning the label to write into the output table.
    ///
    /// Never fails: permanent call failures degrade to [`ERROR_LABEL`], so a
    /// broken classification can never abort a row or the run.
    pub async fn classify(&self, headers: &[String], row: &Row, template: &str) -> String {
        let title = columns::resolve_value(headers, row, LogicalField::Title)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_POSITION);

        let prompt = template.replace(TITLE_PLACEHOLDER, title);

        for attempt in 1..=self.config.max_attempts {
            match self.request(&prompt).await {
                ClassificationOutcome::Success(text) => return text,
                ClassificationOutcome::Blocked(reason) => {
                    warn!(row = row.index + 1, reason, "classification blocked by provider");
                    return format!("Blocked: {reason}");
                }
                ClassificationOutcome::Empty => {
                    warn!(row = row.index + 1, "empty classification response");
                    return NO_CONTENT_LABEL.to_string();
                }
                ClassificationOutcome::RetryableFailure(detail) => {
                    warn!(
                        row = row.index + 1,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        detail,
                        "retryable classification failure"
                    );
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                ClassificationOutcome::FatalFailure(detail) => {
                    error!(row = row.index + 1, detail, "fatal classification failure");
                    return ERROR_LABEL.to_string();
                }
            }
        }

        error!(
            row = row.index + 1,
            attempts = self.config.max_attempts,
            "classification retry budget exhausted"
        );
        ERROR_LABEL.to_string()
    }

    /// One LLM call, with the outcome folded into the tagged union.
    async fn request(&self, prompt: &str) -> ClassificationOutcome {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_output_tokens,
            temperature: 1.0,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            // Transport-level failures (timeout, connect, reset) are transient.
            Err(e) => return ClassificationOutcome::RetryableFailure(e.to_string()),
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = response.text().await.unwrap_or_default();
            return ClassificationOutcome::FatalFailure(format!("HTTP {status}: {detail}"));
        }

        if status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status.is_server_error()
        {
            return ClassificationOutcome::RetryableFailure(format!("HTTP {status}"));
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return ClassificationOutcome::FatalFailure(format!("HTTP {status}: {detail}"));
        }

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "unparseable chat-completions payload");
                return ClassificationOutcome::Empty;
            }
        };

        let Some(choice) = parsed.choices.into_iter().next() else {
            return ClassificationOutcome::Empty;
        };

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return ClassificationOutcome::Blocked("content_filter".to_string());
        }

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => {
                ClassificationOutcome::Success(content.trim().to_string())
            }
            _ => ClassificationOutcome::Empty,
        }
    }
}
