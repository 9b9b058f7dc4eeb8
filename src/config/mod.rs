//! Configuration module for the crawl engine
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every field has a default, so a partial file is sufficient.
//!
//! # Example
//!
//! ```no_run
//! use crawlcore::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Default timeout: {}s", config.crawler.default_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ConcurrencyConfig, Config, CrawlerConfig, RateLimitConfig, RetryConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::load_config;
