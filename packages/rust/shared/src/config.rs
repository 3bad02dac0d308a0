//! Application configuration for leadscrub.
//!
//! User config lives at `~/.leadscrub/leadscrub.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LeadscrubError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadscrub.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadscrub";

// ---------------------------------------------------------------------------
// Config structs (matching leadscrub.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenRouter settings for lead classification.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Classification retry policy.
    #[serde(default)]
    pub classifier: ClassifierPolicyConfig,

    /// MX lookup settings.
    #[serde(default)]
    pub lookup: LookupPolicyConfig,

    /// Google Drive upload settings.
    #[serde(default)]
    pub drive: DrivePolicyConfig,

    /// Operator notification settings.
    #[serde(default)]
    pub notify: NotifyPolicyConfig,
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Default model to use for classification.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Chat-completions API base URL.
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_openrouter_base_url(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierPolicyConfig {
    /// Total attempts per row, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Per-call request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Output token cap; classification labels are one short word.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for ClassifierPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_max_output_tokens() -> u32 {
    8
}

/// `[lookup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupPolicyConfig {
    /// DNS-over-HTTPS resolve endpoint (Google JSON API shape).
    #[serde(default = "default_doh_url")]
    pub doh_url: String,

    /// Timeout for a single DoH request, in seconds.
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum ms between consecutive lookups (upstream throttling guard).
    #[serde(default = "default_lookup_delay_ms")]
    pub delay_ms: u64,
}

impl Default for LookupPolicyConfig {
    fn default() -> Self {
        Self {
            doh_url: default_doh_url(),
            timeout_secs: default_lookup_timeout_secs(),
            delay_ms: default_lookup_delay_ms(),
        }
    }
}

fn default_doh_url() -> String {
    "https://dns.google/resolve".into()
}
fn default_lookup_timeout_secs() -> u64 {
    5
}
fn default_lookup_delay_ms() -> u64 {
    200
}

/// `[drive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivePolicyConfig {
    /// Name of the env var holding the Drive access token.
    #[serde(default = "default_drive_token_env")]
    pub token_env: String,

    /// Destination folder ID for uploaded artifacts.
    #[serde(default)]
    pub folder_id: String,

    /// Multipart upload endpoint.
    #[serde(default = "default_drive_upload_url")]
    pub upload_url: String,

    /// Files/permissions API endpoint.
    #[serde(default = "default_drive_files_url")]
    pub files_url: String,
}

impl Default for DrivePolicyConfig {
    fn default() -> Self {
        Self {
            token_env: default_drive_token_env(),
            folder_id: String::new(),
            upload_url: default_drive_upload_url(),
            files_url: default_drive_files_url(),
        }
    }
}

fn default_drive_token_env() -> String {
    "DRIVE_ACCESS_TOKEN".into()
}
fn default_drive_upload_url() -> String {
    "https://www.googleapis.com/upload/drive/v3/files".into()
}
fn default_drive_files_url() -> String {
    "https://www.googleapis.com/drive/v3/files".into()
}

/// `[notify]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyPolicyConfig {
    /// Name of the env var holding the mail API key.
    #[serde(default = "default_mail_api_key_env")]
    pub api_key_env: String,

    /// Mail API endpoint (JSON POST).
    #[serde(default = "default_mail_endpoint")]
    pub endpoint: String,

    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,

    /// Operator addresses notified at run completion.
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl Default for NotifyPolicyConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_mail_api_key_env(),
            endpoint: default_mail_endpoint(),
            from: default_mail_from(),
            recipients: Vec::new(),
        }
    }
}

fn default_mail_api_key_env() -> String {
    "MAIL_API_KEY".into()
}
fn default_mail_endpoint() -> String {
    "https://api.resend.com/emails".into()
}
fn default_mail_from() -> String {
    "leadscrub@example.com".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + resolved secrets)
// ---------------------------------------------------------------------------

/// Runtime classifier configuration with the API key resolved.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Chat-completions base URL.
    pub base_url: String,
    /// Resolved API key.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Total attempts per row, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Per-call request timeout.
    pub request_timeout: Duration,
    /// Output token cap.
    pub max_output_tokens: u32,
}

impl ClassifierConfig {
    /// Build from the app config, resolving the API key from its env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.openrouter.api_key_env)?;
        Ok(Self {
            base_url: config.openrouter.base_url.clone(),
            api_key,
            model: config.openrouter.default_model.clone(),
            max_attempts: config.classifier.max_attempts,
            retry_delay: Duration::from_secs(config.classifier.retry_delay_secs),
            request_timeout: Duration::from_secs(config.classifier.request_timeout_secs),
            max_output_tokens: config.classifier.max_output_tokens,
        })
    }
}

/// Runtime MX lookup configuration.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// DoH resolve endpoint.
    pub doh_url: String,
    /// DoH request timeout.
    pub timeout: Duration,
    /// Delay inserted by the caller between consecutive lookups.
    pub delay: Duration,
}

impl From<&AppConfig> for LookupConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            doh_url: config.lookup.doh_url.clone(),
            timeout: Duration::from_secs(config.lookup.timeout_secs),
            delay: Duration::from_millis(config.lookup.delay_ms),
        }
    }
}

/// Runtime Drive upload configuration with the token resolved.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Resolved access token.
    pub token: String,
    /// Destination folder ID.
    pub folder_id: String,
    /// Multipart upload endpoint.
    pub upload_url: String,
    /// Files/permissions endpoint.
    pub files_url: String,
}

impl DriveConfig {
    /// Build from the app config, resolving the token from its env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let token = resolve_api_key(&config.drive.token_env)?;
        Ok(Self {
            token,
            folder_id: config.drive.folder_id.clone(),
            upload_url: config.drive.upload_url.clone(),
            files_url: config.drive.files_url.clone(),
        })
    }
}

/// Runtime notification configuration with the key resolved.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Resolved mail API key.
    pub api_key: String,
    /// Mail API endpoint.
    pub endpoint: String,
    /// Sender address.
    pub from: String,
    /// Operator addresses.
    pub recipients: Vec<String>,
}

impl NotifyConfig {
    /// Build from the app config, resolving the key from its env var.
    /// The key is only required once there is someone to notify.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = if config.notify.recipients.is_empty() {
            String::new()
        } else {
            resolve_api_key(&config.notify.api_key_env)?
        };
        Ok(Self {
            api_key,
            endpoint: config.notify.endpoint.clone(),
            from: config.notify.from.clone(),
            recipients: config.notify.recipients.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadscrub/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadscrubError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadscrub/leadscrub.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadscrubError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadscrubError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadscrubError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadscrubError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadscrubError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the named env var, failing with a config error when
/// the variable is unset or empty.
pub fn resolve_api_key(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LeadscrubError::config(format!(
            "secret not found: set the {var_name} environment variable"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("dns.google"));
        assert!(toml_str.contains("DRIVE_ACCESS_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.classifier.max_attempts, 3);
        assert_eq!(parsed.classifier.retry_delay_secs, 5);
        assert_eq!(parsed.lookup.delay_ms, 200);
        assert_eq!(parsed.openrouter.api_key_env, "OPENROUTER_API_KEY");
    }

    #[test]
    fn config_with_recipients() {
        let toml_str = r#"
[notify]
from = "ops@example.com"
recipients = ["a@example.com", "b@example.com"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.notify.recipients.len(), 2);
        assert_eq!(config.notify.from, "ops@example.com");
        // Untouched sections keep their defaults
        assert_eq!(config.lookup.timeout_secs, 5);
    }

    #[test]
    fn lookup_config_from_app_config() {
        let app = AppConfig::default();
        let lookup = LookupConfig::from(&app);
        assert_eq!(lookup.timeout, Duration::from_secs(5));
        assert_eq!(lookup.delay, Duration::from_millis(200));
    }

    #[test]
    fn missing_api_key_is_config_error() {
        // Use a unique env var name to avoid interfering with other tests
        let result = resolve_api_key("LEADSCRUB_TEST_NONEXISTENT_KEY_12345");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("secret not found"));
    }
}
