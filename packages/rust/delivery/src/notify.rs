//! Operator email notification.
//!
//! Best-effort by contract: the collaborator reports failures, and callers
//! log them without letting a failed email change the run's outcome.

use serde::Serialize;
use tracing::{debug, info};

use leadscrub_shared::config::NotifyConfig;
use leadscrub_shared::{LeadscrubError, Result};

#[derive(Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

/// Mail API collaborator.
pub struct Notifier {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl Notifier {
    /// Create a notifier from the runtime configuration.
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LeadscrubError::Notification(format!("failed to build mail client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Send one email to every configured recipient.
    pub async fn send(&self, subject: &str, body: &str) -> Result<()> {
        if self.config.recipients.is_empty() {
            debug!("no notification recipients configured, skipping send");
            return Ok(());
        }

        let request = MailRequest {
            from: &self.config.from,
            to: &self.config.recipients,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LeadscrubError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadscrubError::Notification(format!("HTTP {status}")));
        }

        info!(
            recipients = self.config.recipients.len(),
            subject, "notification sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: String, recipients: Vec<String>) -> NotifyConfig {
        NotifyConfig {
            api_key: "mail-key".into(),
            endpoint,
            from: "leadscrub@example.com".into(),
            recipients,
        }
    }

    #[tokio::test]
    async fn posts_subject_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(body_string_contains("leads.csv processed"))
            .and(body_string_contains("ops@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "m1" })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(test_config(
            format!("{}/emails", server.uri()),
            vec!["ops@example.com".into()],
        ))
        .unwrap();

        notifier
            .send("leads.csv processed", "All rows enriched.")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn no_recipients_is_a_silent_no_op() {
        // No server at all; the call must not attempt the network.
        let notifier = Notifier::new(test_config("http://127.0.0.1:1/emails".into(), vec![])).unwrap();
        notifier.send("subject", "body").await.unwrap();
    }

    #[tokio::test]
    async fn http_failure_is_notification_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = Notifier::new(test_config(
            format!("{}/emails", server.uri()),
            vec!["ops@example.com".into()],
        ))
        .unwrap();

        let err = notifier.send("subject", "body").await.unwrap_err();
        assert!(matches!(err, LeadscrubError::Notification(_)));
    }
}
