//! Adaptive dual-limit concurrency control
//!
//! Two nested limits govern in-flight fetches: a dynamic base limit
//! (steady-state) and a fixed burst limit (hard ceiling). After each
//! completed fetch the controller updates a rolling success-rate estimate
//! and, at most once per outcome batch, steps the base limit up or down by
//! one. Permits are tokio semaphore permits, so acquisition suspends the
//! caller without blocking a thread.

use crate::config::ConcurrencyConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Result of a completed fetch, fed back into the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// A held fetch slot: one base permit and one burst permit
///
/// Dropping the permit returns both slots. Prefer
/// [`ConcurrencyController::release`] so the outcome feeds the
/// success-rate estimate.
pub struct Permit {
    _base: OwnedSemaphorePermit,
    _burst: OwnedSemaphorePermit,
}

struct OutcomeWindow {
    /// Current base limit, mirrored by the base semaphore's permit count
    /// minus any outstanding forget debt
    current_base: u32,
    /// Rolling record of recent outcomes, true = success
    outcomes: VecDeque<bool>,
    /// Outcomes recorded since the last adjustment
    since_adjust: usize,
    /// Base permits that still need to be withheld: a downward adjustment
    /// while every permit is held (or handed straight to a queued waiter)
    /// cannot remove an available permit, so the next releases swallow
    /// their permits instead of returning them
    forget_debt: usize,
}

/// Process-wide adaptive concurrency controller
///
/// Shared across all running tasks via `Arc`; concurrency is a global
/// resource, not a per-task one.
pub struct ConcurrencyController {
    base: Arc<Semaphore>,
    burst: Arc<Semaphore>,
    window: Mutex<OutcomeWindow>,
    config: ConcurrencyConfig,
}

impl ConcurrencyController {
    /// Creates a controller from configuration
    ///
    /// Assumes the configuration has been validated: burst >= base >= floor
    /// >= 1.
    pub fn new(config: &ConcurrencyConfig) -> Self {
        Self {
            base: Arc::new(Semaphore::new(config.base_limit as usize)),
            burst: Arc::new(Semaphore::new(config.burst_limit as usize)),
            window: Mutex::new(OutcomeWindow {
                current_base: config.base_limit,
                outcomes: VecDeque::with_capacity(config.outcome_window),
                since_adjust: 0,
                forget_debt: 0,
            }),
            config: config.clone(),
        }
    }

    /// Acquires a fetch slot, suspending until one is available
    ///
    /// Requires both a base-limit slot and a burst-limit slot.
    pub async fn acquire(&self) -> Permit {
        let base = self
            .base
            .clone()
            .acquire_owned()
            .await
            .expect("base semaphore closed");
        let burst = self
            .burst
            .clone()
            .acquire_owned()
            .await
            .expect("burst semaphore closed");

        Permit {
            _base: base,
            _burst: burst,
        }
    }

    /// Returns a fetch slot and records the outcome
    ///
    /// At most once per completed batch, steps the base limit by one
    /// according to the rolling success rate.
    pub fn release(&self, permit: Permit, outcome: Outcome) {
        let Permit {
            _base: base,
            _burst: burst,
        } = permit;
        drop(burst);

        let mut window = self.window.lock().unwrap();

        // Settle outstanding downward adjustments: withhold this base
        // permit instead of returning it
        if window.forget_debt > 0 {
            window.forget_debt -= 1;
            base.forget();
        } else {
            drop(base);
        }

        window.outcomes.push_back(outcome == Outcome::Success);
        while window.outcomes.len() > self.config.outcome_window {
            window.outcomes.pop_front();
        }
        window.since_adjust += 1;

        if window.since_adjust < self.config.adjust_batch {
            return;
        }
        window.since_adjust = 0;

        let successes = window.outcomes.iter().filter(|&&ok| ok).count();
        let rate = successes as f64 / window.outcomes.len() as f64;

        let new_base = adjust_limits(
            window.current_base,
            self.config.floor,
            self.config.burst_limit,
            rate,
            self.config.increase_threshold,
            self.config.decrease_threshold,
            self.config.gradual_increase,
        );

        if new_base > window.current_base {
            self.base.add_permits(1);
            tracing::info!(base = new_base, success_rate = rate, "raised base limit");
        } else if new_base < window.current_base {
            // forget_permits only removes permits that are currently
            // available; under saturation it removes none and the shortfall
            // becomes debt settled by later releases
            let removed = self.base.forget_permits(1);
            window.forget_debt += 1 - removed;
            tracing::info!(base = new_base, success_rate = rate, "lowered base limit");
        }
        window.current_base = new_base;
    }

    /// Current base limit
    pub fn base_limit(&self) -> u32 {
        self.window.lock().unwrap().current_base
    }

    /// Configured burst ceiling
    pub fn burst_limit(&self) -> u32 {
        self.config.burst_limit
    }
}

/// Computes the next base limit from the current one and recent outcomes
///
/// Pure policy function: success rate above the increase threshold steps the
/// limit up by one (when gradual increase is enabled), below the decrease
/// threshold steps it down by one. Steps are always +-1 to avoid
/// oscillation; the result stays within [floor, ceiling].
pub fn adjust_limits(
    current: u32,
    floor: u32,
    ceiling: u32,
    success_rate: f64,
    increase_threshold: f64,
    decrease_threshold: f64,
    gradual_increase: bool,
) -> u32 {
    if success_rate > increase_threshold && gradual_increase {
        (current + 1).min(ceiling)
    } else if success_rate < decrease_threshold {
        current.saturating_sub(1).max(floor).max(1)
    } else {
        current
    }
}
