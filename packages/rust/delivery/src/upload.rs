//! Google Drive artifact upload.
//!
//! Uploads the serialized output CSV with a single multipart/related request
//! (metadata part + media part), grants world-readable access, and returns
//! the shareable link. Endpoints come from config so tests can point them at
//! a mock server.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};

use leadscrub_shared::config::DriveConfig;
use leadscrub_shared::{LeadscrubError, Result};

/// Timeout for upload requests; artifacts are small CSVs.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Boundary for the multipart/related request body.
const MULTIPART_BOUNDARY: &str = "leadscrub-upload-boundary";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

/// Drive upload collaborator.
pub struct DriveUploader {
    client: reqwest::Client,
    config: DriveConfig,
}

impl DriveUploader {
    /// Create an uploader from the runtime configuration.
    pub fn new(config: DriveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| LeadscrubError::Upload(format!("failed to build upload client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Upload CSV bytes under `file_name` and return a public share link.
    #[instrument(skip_all, fields(file_name = %file_name, bytes = csv_bytes.len()))]
    pub async fn upload_csv(&self, csv_bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let mut metadata = serde_json::json!({ "name": file_name });
        if !self.config.folder_id.is_empty() {
            metadata["parents"] = serde_json::json!([self.config.folder_id]);
        }

        let body = multipart_related(&metadata, &csv_bytes, MULTIPART_BOUNDARY);
        let url = format!("{}?uploadType=multipart&fields=id", self.config.upload_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| LeadscrubError::Upload(format!("{file_name}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LeadscrubError::Upload(format!(
                "{file_name}: HTTP {status}: {detail}"
            )));
        }

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| LeadscrubError::Upload(format!("{file_name}: malformed response: {e}")))?;

        self.make_public(&file.id).await?;

        let link = share_link(&file.id);
        info!(file_name, file_id = %file.id, "artifact uploaded");
        Ok(link)
    }

    /// Grant anyone-with-the-link reader access.
    async fn make_public(&self, file_id: &str) -> Result<()> {
        let url = format!("{}/{file_id}/permissions", self.config.files_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "type": "anyone", "role": "reader" }))
            .send()
            .await
            .map_err(|e| LeadscrubError::Upload(format!("permission grant: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadscrubError::Upload(format!(
                "permission grant: HTTP {status}"
            )));
        }

        Ok(())
    }
}

/// Assemble a multipart/related body: JSON metadata part, then the CSV media
/// part. Drive's multipart upload endpoint requires this layout.
fn multipart_related(metadata: &serde_json::Value, media: &[u8], boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Public share link for an uploaded file.
fn share_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view?usp=sharing")
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> DriveConfig {
        DriveConfig {
            token: "test-token".into(),
            folder_id: "folder-123".into(),
            upload_url: format!("{base}/upload/drive/v3/files"),
            files_url: format!("{base}/drive/v3/files"),
        }
    }

    #[test]
    fn multipart_body_layout() {
        let metadata = serde_json::json!({ "name": "leads.csv" });
        let body = multipart_related(&metadata, b"a,b\n1,2\n", "XYZ");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains(r#"{"name":"leads.csv"}"#));
        assert!(text.contains("Content-Type: text/csv"));
        assert!(text.contains("a,b\n1,2\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn share_link_format() {
        assert_eq!(
            share_link("abc123"),
            "https://drive.google.com/file/d/abc123/view?usp=sharing"
        );
    }

    #[tokio::test]
    async fn uploads_and_grants_access() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .and(query_param("uploadType", "multipart"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "abc123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files/abc123/permissions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "perm-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let uploader = DriveUploader::new(test_config(&server.uri())).unwrap();
        let link = uploader
            .upload_csv(b"a,b\n1,2\n".to_vec(), "leads.csv")
            .await
            .unwrap();

        assert_eq!(link, "https://drive.google.com/file/d/abc123/view?usp=sharing");
    }

    #[tokio::test]
    async fn upload_failure_is_upload_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let uploader = DriveUploader::new(test_config(&server.uri())).unwrap();
        let err = uploader
            .upload_csv(b"a,b\n".to_vec(), "leads.csv")
            .await
            .unwrap_err();

        assert!(matches!(err, LeadscrubError::Upload(_)));
        assert!(err.to_string().contains("503"));
    }
}
