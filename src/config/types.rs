use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for the crawl engine
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Default maximum depth for crawl requests (0 = unlimited)
    #[serde(default = "default_max_depth", rename = "max-depth")]
    pub max_depth: u32,

    /// Default per-request timeout in seconds
    #[serde(default = "default_timeout_secs", rename = "default-timeout-secs")]
    pub default_timeout_secs: u64,

    /// User agent string sent with every request
    #[serde(default = "default_user_agent", rename = "user-agent")]
    pub user_agent: String,
}

/// Per-domain sliding-window rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Default requests allowed per domain within one window
    #[serde(default = "default_domain_limit", rename = "default-limit")]
    pub default_limit: u32,

    /// Length of the sliding window in seconds
    #[serde(default = "default_window_secs", rename = "window-secs")]
    pub window_secs: u64,

    /// Per-domain limit overrides, keyed by lowercase host
    #[serde(default, rename = "domain-limits")]
    pub domain_limits: HashMap<String, u32>,
}

/// Adaptive concurrency configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConcurrencyConfig {
    /// Steady-state concurrent fetch count
    #[serde(default = "default_base_limit", rename = "base-limit")]
    pub base_limit: u32,

    /// Hard ceiling on concurrent fetches, always >= base-limit
    #[serde(default = "default_burst_limit", rename = "burst-limit")]
    pub burst_limit: u32,

    /// Lowest value the base limit may be reduced to
    #[serde(default = "default_floor", rename = "floor")]
    pub floor: u32,

    /// Whether the base limit may grow when success rate is high
    #[serde(default = "default_true", rename = "gradual-increase")]
    pub gradual_increase: bool,

    /// Number of recent outcomes kept for the success-rate estimate
    #[serde(default = "default_outcome_window", rename = "outcome-window")]
    pub outcome_window: usize,

    /// Outcomes that must complete between two adjustments
    #[serde(default = "default_adjust_batch", rename = "adjust-batch")]
    pub adjust_batch: usize,

    /// Success rate above which the base limit is incremented
    #[serde(default = "default_increase_threshold", rename = "increase-threshold")]
    pub increase_threshold: f64,

    /// Success rate below which the base limit is decremented
    #[serde(default = "default_decrease_threshold", rename = "decrease-threshold")]
    pub decrease_threshold: f64,
}

/// Retry and backoff configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum retry attempts for transient failures
    #[serde(default = "default_max_retries", rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms", rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Exponential backoff multiplier
    #[serde(default = "default_multiplier", rename = "multiplier")]
    pub multiplier: f64,

    /// Backoff delay ceiling in milliseconds
    #[serde(default = "default_max_delay_ms", rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory where JSON storage files are written
    #[serde(default = "default_data_dir", rename = "data-dir")]
    pub data_dir: String,
}

fn default_max_depth() -> u32 {
    0
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("crawlcore/{}", env!("CARGO_PKG_VERSION"))
}

fn default_domain_limit() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

fn default_base_limit() -> u32 {
    10
}

fn default_burst_limit() -> u32 {
    20
}

fn default_floor() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_outcome_window() -> usize {
    50
}

fn default_adjust_batch() -> usize {
    20
}

fn default_increase_threshold() -> f64 {
    0.9
}

fn default_decrease_threshold() -> f64 {
    0.7
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_limit: default_domain_limit(),
            window_secs: default_window_secs(),
            domain_limits: HashMap::new(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            base_limit: default_base_limit(),
            burst_limit: default_burst_limit(),
            floor: default_floor(),
            gradual_increase: default_true(),
            outcome_window: default_outcome_window(),
            adjust_batch: default_adjust_batch(),
            increase_threshold: default_increase_threshold(),
            decrease_threshold: default_decrease_threshold(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}
