//! BFS frontier: queue, visited set, and discovery filters
//!
//! Each task owns one frontier outright; there is no cross-task sharing.
//! Dequeue order is FIFO, so all depth-d entries are dequeued before any
//! depth-(d+1) entry. The visited set is updated at enqueue time - checking
//! at fetch time would let concurrent discoveries queue the same URL twice.

use crate::url::{is_same_domain, normalize};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Path suffixes that are never crawlable page content
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar", ".gz",
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".css", ".js", ".xml", ".txt", ".csv",
];

/// A URL waiting to be fetched
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: Url,
    /// Absolute URL as it was discovered, before canonicalization
    pub raw: String,
    /// BFS depth (root = 0)
    pub depth: u32,
    /// The page this URL was discovered on, if any
    pub referrer: Option<Url>,
}

/// Frontier lifecycle for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierState {
    /// Root enqueued, nothing dequeued yet
    Seeded,
    /// Dequeuing in progress
    Draining,
    /// Queue empty and no in-flight fetches remain
    Drained,
    /// Cancellation requested; no further dequeues
    Cancelled,
}

/// Per-task BFS frontier with deduplication
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    root: Url,
    max_depth: u32,
    state: FrontierState,
}

impl Frontier {
    /// Creates a frontier seeded with the normalized root URL at depth 0
    ///
    /// `requested` is the root URL string as submitted, kept alongside the
    /// canonical form. The root must already be normalized; it is inserted
    /// into the visited set immediately.
    pub fn seed(root: Url, requested: &str) -> Self {
        let mut visited = HashSet::new();
        visited.insert(root.to_string());

        let mut queue = VecDeque::new();
        queue.push_back(FrontierEntry {
            url: root.clone(),
            raw: requested.to_string(),
            depth: 0,
            referrer: None,
        });

        Self {
            queue,
            visited,
            root,
            max_depth: 0,
            state: FrontierState::Seeded,
        }
    }

    /// Sets the depth limit (0 = unlimited)
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Dequeues the next URL in FIFO order
    ///
    /// Returns `None` when the queue is empty or the frontier is cancelled.
    pub fn next(&mut self) -> Option<FrontierEntry> {
        if self.state == FrontierState::Cancelled {
            return None;
        }
        let entry = self.queue.pop_front()?;
        self.state = FrontierState::Draining;
        Some(entry)
    }

    /// Feeds discovered links back into the frontier
    ///
    /// Filters, in order: normalization failure, raw fragment, non-content
    /// extension, cross-domain, depth limit, already visited. Filtered links
    /// stay in the discovering page's link list; they are only excluded from
    /// traversal. Returns the number of links enqueued.
    pub fn discover(&mut self, links: &[String], from_depth: u32, from_url: &Url) -> usize {
        if self.state == FrontierState::Cancelled {
            return 0;
        }

        let next_depth = from_depth + 1;
        let mut enqueued = 0;

        for link in links {
            let normalized = match normalize(link, Some(from_url)) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(link, error = %e, "dropping unparseable link");
                    continue;
                }
            };

            // A fragment marks a position within an already-known page
            if link.contains('#') {
                continue;
            }

            if has_skipped_extension(&normalized) {
                continue;
            }

            if !is_same_domain(&normalized, &self.root) {
                continue;
            }

            if self.max_depth != 0 && next_depth > self.max_depth {
                continue;
            }

            let key = normalized.to_string();
            if !self.visited.insert(key) {
                continue;
            }

            // The absolutized href, before canonicalization
            let raw = from_url
                .join(link)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| link.clone());

            self.queue.push_back(FrontierEntry {
                url: normalized,
                raw,
                depth: next_depth,
                referrer: Some(from_url.clone()),
            });
            enqueued += 1;
        }

        enqueued
    }

    /// Marks the frontier cancelled; subsequent dequeues and discoveries
    /// are no-ops
    pub fn cancel(&mut self) {
        self.state = FrontierState::Cancelled;
    }

    /// Marks the frontier drained once the queue is empty and the caller
    /// has no in-flight fetches left
    pub fn mark_drained(&mut self) {
        if self.state != FrontierState::Cancelled {
            self.state = FrontierState::Drained;
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FrontierState {
        self.state
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether a normalized URL has already been enqueued or fetched
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }
}

/// Checks whether the URL path ends in a known non-content extension
fn has_skipped_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
