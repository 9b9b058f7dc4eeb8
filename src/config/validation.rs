use crate::config::types::{ConcurrencyConfig, Config, RateLimitConfig, RetryConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_rate_limit_config(&config.rate_limit)?;
    validate_concurrency_config(&config.concurrency)?;
    validate_retry_config(&config.retry)?;
    Ok(())
}

/// Validates rate limiting configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.default_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit.default-limit must be >= 1, got {}",
            config.default_limit
        )));
    }

    if config.window_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-limit.window-secs must be >= 1, got {}",
            config.window_secs
        )));
    }

    for (domain, limit) in &config.domain_limits {
        if *limit < 1 {
            return Err(ConfigError::Validation(format!(
                "rate-limit override for '{}' must be >= 1, got {}",
                domain, limit
            )));
        }
    }

    Ok(())
}

/// Validates concurrency configuration
fn validate_concurrency_config(config: &ConcurrencyConfig) -> Result<(), ConfigError> {
    if config.floor < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency.floor must be >= 1, got {}",
            config.floor
        )));
    }

    if config.base_limit < config.floor {
        return Err(ConfigError::Validation(format!(
            "concurrency.base-limit ({}) must be >= floor ({})",
            config.base_limit, config.floor
        )));
    }

    if config.burst_limit < config.base_limit {
        return Err(ConfigError::Validation(format!(
            "concurrency.burst-limit ({}) must be >= base-limit ({})",
            config.burst_limit, config.base_limit
        )));
    }

    if config.outcome_window == 0 || config.adjust_batch == 0 {
        return Err(ConfigError::Validation(
            "concurrency.outcome-window and adjust-batch must be >= 1".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.increase_threshold)
        || !(0.0..=1.0).contains(&config.decrease_threshold)
    {
        return Err(ConfigError::Validation(
            "concurrency thresholds must be within [0.0, 1.0]".to_string(),
        ));
    }

    if config.decrease_threshold >= config.increase_threshold {
        return Err(ConfigError::Validation(format!(
            "concurrency.decrease-threshold ({}) must be below increase-threshold ({})",
            config.decrease_threshold, config.increase_threshold
        )));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.multiplier <= 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry.multiplier must be > 1.0, got {}",
            config.multiplier
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry.max-delay-ms ({}) must be >= base-delay-ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    Ok(())
}
