//! Shared types, error model, and configuration for leadscrub.
//!
//! This crate is the foundation depended on by all other leadscrub crates.
//! It provides:
//! - [`LeadscrubError`] — the unified error type
//! - Domain types ([`ProviderResult`], [`RunId`], [`RunReport`])
//! - Configuration ([`AppConfig`], runtime configs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClassifierConfig, DriveConfig, LookupConfig, NotifyConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{LeadscrubError, Result};
pub use types::{
    BUNDLE_COLUMN, CLASSIFICATION_COLUMN, PROVIDER_COLUMN, ProviderResult, RunId, RunReport,
};
