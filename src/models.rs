//! Data model for crawl tasks, pages, and results
//!
//! External layers serialize these as needed (JSON via serde); the engine
//! itself defines no wire format beyond the shapes here.

use crate::retry::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Status of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl CrawlStatus {
    /// Terminal statuses are never left again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Which page fields to extract, per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractFlags {
    #[serde(default = "flag_on")]
    pub text: bool,
    #[serde(default)]
    pub images: bool,
    #[serde(default = "flag_on")]
    pub links: bool,
    #[serde(default = "flag_on")]
    pub headings: bool,
    #[serde(default)]
    pub image_alt_text: bool,
    #[serde(default = "flag_on")]
    pub canonical_url: bool,
}

fn flag_on() -> bool {
    true
}

impl Default for ExtractFlags {
    fn default() -> Self {
        Self {
            text: true,
            images: false,
            links: true,
            headings: true,
            image_alt_text: false,
            canonical_url: true,
        }
    }
}

/// A request to crawl a website starting from a root URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Root URL the crawl starts from
    pub url: String,

    /// Maximum crawl depth; 0 means unlimited
    #[serde(default)]
    pub max_depth: u32,

    /// Whether internal links are followed beyond the root page
    #[serde(default)]
    pub follow_links: bool,

    /// Extraction flags
    #[serde(default)]
    pub extract: ExtractFlags,

    /// Extra headers sent with every request of this task
    #[serde(default)]
    pub custom_headers: Option<HashMap<String, String>>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl CrawlRequest {
    /// Creates a request with default flags for the given root URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_depth: 0,
            follow_links: false,
            extract: ExtractFlags::default(),
            custom_headers: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Structured error recorded against a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageError {
    pub kind: ErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub retry_attempts: u32,
}

/// A single crawled page, successful or terminally failed
///
/// Created once per fetch outcome; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    /// URL as it was discovered, before canonicalization
    pub url: String,

    /// Canonical form used for deduplication
    pub normalized_url: String,

    pub title: Option<String>,
    pub text_content: Option<String>,
    pub images: Vec<String>,

    /// Every observed link, including cross-domain ones that are never
    /// traversed
    pub links: Vec<String>,

    pub meta_description: Option<String>,

    /// Headings keyed by level ("h1".."h3")
    pub headings: HashMap<String, Vec<String>>,

    pub image_alt_text: Vec<String>,
    pub canonical_url: Option<String>,

    /// HTTP status code; 0 when no response was received
    pub status_code: u16,

    /// Seconds spent on the final attempt
    pub response_time: f64,

    /// BFS depth at which this page was reached (root = 0)
    pub depth: u32,

    pub error: Option<PageError>,
    pub retry_attempts: u32,
    pub crawled_at: DateTime<Utc>,
}

impl CrawledPage {
    /// An empty page record for a URL reached at the given depth
    pub fn reached(url: impl Into<String>, normalized_url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            normalized_url: normalized_url.into(),
            title: None,
            text_content: None,
            images: Vec::new(),
            links: Vec::new(),
            meta_description: None,
            headings: HashMap::new(),
            image_alt_text: Vec::new(),
            canonical_url: None,
            status_code: 0,
            response_time: 0.0,
            depth,
            error: None,
            retry_attempts: 0,
            crawled_at: Utc::now(),
        }
    }
}

/// Retry statistics aggregated over one task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryStats {
    pub total_retries: u64,
    pub successful_retries: u64,
    pub failed_retries: u64,
    pub transient_errors: u64,
    pub permanent_errors: u64,
}

/// The aggregate result of a crawl task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub task_id: String,
    pub status: CrawlStatus,
    pub total_pages: usize,
    pub pages: Vec<CrawledPage>,
    /// Human-readable error messages, one per failed page
    pub errors: Vec<String>,
    /// Structured errors mirroring `errors`
    pub structured_errors: Vec<PageError>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Total seconds from start to completion
    pub duration: Option<f64>,
    pub retry_stats: RetryStats,
}

impl CrawlResult {
    /// A fresh in-progress result shell for a task
    pub fn started(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: CrawlStatus::InProgress,
            total_pages: 0,
            pages: Vec::new(),
            errors: Vec::new(),
            structured_errors: Vec::new(),
            started_at: Some(Utc::now()),
            completed_at: None,
            duration: None,
            retry_stats: RetryStats::default(),
        }
    }
}

/// A crawl task with identity and lifecycle timestamps
///
/// Owned exclusively by the orchestrator for its lifetime; read-only to
/// external callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    /// Opaque unique token (UUID v4)
    pub task_id: String,
    pub request: CrawlRequest,
    pub status: CrawlStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CrawlTask {
    /// Creates a pending task with a fresh id
    pub fn new(request: CrawlRequest) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4().to_string(),
            request,
            status: CrawlStatus::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }
}
