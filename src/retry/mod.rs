//! Failure classification and backoff policy
//!
//! Transient failures (timeouts, connection errors, 5xx, 429) are retried
//! with exponential backoff; permanent failures (other 4xx, malformed URLs,
//! content-type mismatches) are recorded immediately. Exhausting retries
//! records the page as failed but never fails the whole task.

use crate::config::RetryConfig;
use crate::crawler::FetchFailure;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification of a fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Worth retrying: timeouts, connection resets, 5xx, 429
    Transient,
    /// Retrying will not help: other 4xx, malformed URLs, wrong content type
    Permanent,
}

/// Retry policy: classification plus backoff computation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from configuration
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Maximum retry attempts for transient failures
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Classifies a fetch failure as transient or permanent
    pub fn classify(&self, failure: &FetchFailure) -> ErrorKind {
        match failure {
            FetchFailure::Timeout(_) | FetchFailure::Connect(_) => ErrorKind::Transient,
            FetchFailure::HttpStatus(status) => {
                if *status == 429 || (500..600).contains(status) {
                    ErrorKind::Transient
                } else {
                    ErrorKind::Permanent
                }
            }
            FetchFailure::ContentTypeMismatch { .. }
            | FetchFailure::MalformedUrl(_)
            | FetchFailure::Transport(_) => ErrorKind::Permanent,
        }
    }

    /// Whether another attempt should be made after this failure
    pub fn should_retry(&self, failure: &FetchFailure, attempts_so_far: u32) -> bool {
        self.classify(failure) == ErrorKind::Transient && attempts_so_far < self.max_retries
    }

    /// Backoff delay before retry attempt `attempt` (1-indexed), with jitter
    ///
    /// The capped exponential delay gains a uniform random addition in
    /// `[0, delay)` so concurrent retries against the same domain do not
    /// resynchronize.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self.capped_delay(attempt);
        if delay.is_zero() {
            return delay;
        }
        let jitter = delay.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        delay + jitter
    }

    /// Capped exponential delay for attempt `attempt` (1-indexed), no jitter
    pub fn capped_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.powi(attempt as i32 - 1);
        let delay = self.base_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }
}
