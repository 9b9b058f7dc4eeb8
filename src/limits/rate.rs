//! Per-domain sliding-window rate limiting
//!
//! Each domain keeps the ordered timestamps of its recent requests. An
//! admission check prunes entries older than the window and allows the
//! request iff the remaining count is under the domain's limit. State is
//! process-wide: concurrent tasks hitting the same domain share one window.

use crate::config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed; its timestamp has been recorded
    Allowed,
    /// The window is full; retry after the given duration
    Denied {
        /// Time until the oldest recorded request exits the window
        retry_after: Duration,
    },
}

/// Per-domain sliding-window rate limiter
///
/// This is a blocking gate, not a queue: a denied caller must wait and
/// re-check. Internally synchronized; share via `Arc` across tasks.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    window: Duration,
    default_limit: u32,
    domain_limits: HashMap<String, u32>,
}

impl RateLimiter {
    /// Creates a rate limiter from configuration
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window: Duration::from_secs(config.window_secs),
            default_limit: config.default_limit,
            domain_limits: config.domain_limits.clone(),
        }
    }

    /// Returns the configured limit for a domain
    ///
    /// Falls back to the default limit when the domain has no override.
    pub fn limit_for(&self, domain: &str) -> u32 {
        self.domain_limits
            .get(domain)
            .copied()
            .unwrap_or(self.default_limit)
    }

    /// Checks admission for a domain at the current instant
    ///
    /// An allowed admission records its timestamp atomically under the same
    /// lock, so concurrent callers cannot both pass on the last free slot.
    pub fn try_admit(&self, domain: &str) -> Admission {
        self.try_admit_at(domain, Instant::now())
    }

    /// Checks admission for a domain at an explicit instant
    pub fn try_admit_at(&self, domain: &str, now: Instant) -> Admission {
        let limit = self.limit_for(domain) as usize;
        let mut windows = self.windows.lock().unwrap();
        let timestamps = windows.entry(domain.to_string()).or_default();

        // Prune entries that have slid out of the window
        while timestamps
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            timestamps.pop_front();
        }

        if timestamps.len() < limit {
            timestamps.push_back(now);
            tracing::debug!(
                domain,
                used = timestamps.len(),
                limit,
                "rate limit admission"
            );
            Admission::Allowed
        } else {
            // Oldest entry determines when the next slot frees up
            let retry_after = timestamps
                .front()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(self.window);
            tracing::debug!(domain, limit, ?retry_after, "rate limit denial");
            Admission::Denied { retry_after }
        }
    }

    /// Waits until the domain admits a request
    ///
    /// Suspends and re-checks whenever admission is denied.
    pub async fn admit(&self, domain: &str) {
        loop {
            match self.try_admit(domain) {
                Admission::Allowed => return,
                Admission::Denied { retry_after } => {
                    // Never spin on a zero-length denial
                    let wait = retry_after.max(Duration::from_millis(10));
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Returns the number of requests currently counted against a domain
    pub fn current_count(&self, domain: &str) -> usize {
        let now = Instant::now();
        let windows = self.windows.lock().unwrap();
        windows
            .get(domain)
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|&&t| now.duration_since(t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }
}
