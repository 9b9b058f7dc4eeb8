//! Shared admission control services
//!
//! Both services here are process-wide mutable state shared by every running
//! task. They are injected as `Arc` service objects rather than ambient
//! globals so tests can construct deterministic instances.

mod concurrency;
mod rate;

pub use concurrency::{adjust_limits, ConcurrencyController, Outcome, Permit};
pub use rate::{Admission, RateLimiter};
