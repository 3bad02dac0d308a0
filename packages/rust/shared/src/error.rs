//! Error types for leadscrub.
//!
//! Library crates use [`LeadscrubError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all leadscrub operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadscrubError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input dataset error (missing header row, unreadable CSV payload).
    #[error("input error: {message}")]
    Input { message: String },

    /// LLM classification infrastructure failure (client construction).
    /// Per-call failures are folded into classification outcomes instead
    /// and degrade to an "Error" label, never into this variant.
    #[error("classification error: {0}")]
    Classification(String),

    /// DNS/MX lookup failure on both the primary and fallback paths.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Artifact upload failure. Terminal for the whole run.
    #[error("upload error: {0}")]
    Upload(String),

    /// Operator notification failure. Logged by callers, never escalated.
    #[error("notification error: {0}")]
    Notification(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadscrubError>;

impl LeadscrubError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LeadscrubError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = LeadscrubError::input("CSV data is missing headers");
        assert!(err.to_string().contains("missing headers"));

        let err = LeadscrubError::Upload("Drive returned HTTP 503".into());
        assert_eq!(err.to_string(), "upload error: Drive returned HTTP 503");
    }
}
