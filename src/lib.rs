//! Sitescope: a technical SEO site crawler and issue analyzer
//!
//! This crate crawls a target website, extracts structural and content
//! signals from every page, and runs a rule catalog over the crawled corpus
//! to produce a prioritized list of SEO, content and AI-readiness issues.

pub mod analyzer;
pub mod config;
pub mod crawler;
pub mod report;
pub mod robots;
pub mod run;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sitescope operations
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid run request: {0}")]
    Validation(String),

    #[error("Run setup failed: {0}")]
    Setup(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sitescope operations
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crate::url::{normalize_url, LinkKind};
pub use run::{process_run, request_run, RunRequest};
