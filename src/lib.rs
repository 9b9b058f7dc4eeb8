//! Crawlcore: a bounded-depth website crawl engine
//!
//! This crate implements the core of a crawling service: breadth-first
//! traversal of a site's internal links with deduplication, per-domain
//! sliding-window rate limiting, adaptive concurrency control, and
//! retry/failure classification. HTTP transport, HTML extraction, and
//! persistence sit behind narrow trait boundaries.

pub mod config;
pub mod crawler;
pub mod limits;
pub mod models;
pub mod retry;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl engine operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Root URL unreachable: {url}: {message}")]
    RootUnreachable { url: String, message: String },

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
}

/// URL normalization errors
///
/// These are non-retryable: a link that fails normalization is logged and
/// dropped from discovery, never fatal to the task.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl engine operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Frontier, Orchestrator};
pub use limits::{ConcurrencyController, RateLimiter};
pub use models::{CrawlRequest, CrawlResult, CrawlStatus, CrawlTask, CrawledPage};
pub use retry::{ErrorKind, RetryPolicy};
pub use url::{extract_host, is_same_domain, normalize};
