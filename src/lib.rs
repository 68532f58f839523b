//! Apod-Harvest: a resumable archive image harvester
//!
//! This crate incrementally walks a paginated archive index, extracts the
//! image link behind each daily entry, and downloads every image exactly
//! once, surviving restarts and transient network failures.

pub mod cache;
pub mod config;
pub mod harvest;
pub mod model;
pub mod progress;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Apod-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Retry budget exhausted after {attempts} attempts for {url}: {source}")]
    RetryExhausted {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },

    #[error("Index page format changed: {0}")]
    IndexFormat(String),

    #[error("Index page {url} does not exist")]
    IndexMissing { url: String },

    #[error("Link cache not found at {path}; run a crawl first")]
    CacheMissing { path: PathBuf },

    #[error("Link cache format error: {0}")]
    CacheFormat(#[from] serde_json::Error),

    #[error("Cannot derive asset name for {entry} from link {link}")]
    AssetName { entry: String, link: String },

    #[error("Progress store error: {0}")]
    Store(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Harvest interrupted")]
    Cancelled,
}

impl HarvestError {
    /// Whether this error must abort the whole run rather than a single entry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RetryExhausted { .. }
                | Self::IndexFormat(_)
                | Self::IndexMissing { .. }
                | Self::CacheMissing { .. }
                | Self::Store(_)
                | Self::Cancelled
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Apod-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{DownloadOutcome, EntryId, LinkRecord};
