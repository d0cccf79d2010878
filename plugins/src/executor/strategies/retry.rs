use std::time::Duration;

use sitecrew_core::api::{RetryConfig, RetryStrategyPlugin, TaskError};

pub struct ExponentialBackoffPlugin {
    config: RetryConfig,
}

pub struct LinearRetryPlugin {
    config: RetryConfig,
}

/// Retries immediately.
pub struct NoDelayRetryPlugin;

impl ExponentialBackoffPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl LinearRetryPlugin {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryStrategyPlugin for ExponentialBackoffPlugin {
    fn name(&self) -> &str {
        "exponential-backoff"
    }

    fn next_delay(&self, attempt: u32, error: &TaskError) -> Duration {
        // A rejected answer is a content problem; backing off does not help.
        if matches!(error, TaskError::Validation(_)) {
            return Duration::from_millis(self.config.base_delay_ms.min(self.config.max_delay_ms));
        }
        let exp = 1u64 << attempt.min(30);
        let delay = self.config.base_delay_ms.saturating_mul(exp);
        Duration::from_millis(delay.min(self.config.max_delay_ms))
    }
}

impl RetryStrategyPlugin for LinearRetryPlugin {
    fn name(&self) -> &str {
        "linear"
    }

    fn next_delay(&self, attempt: u32, _error: &TaskError) -> Duration {
        let multiplier = attempt.saturating_add(1) as u64;
        let delay = self.config.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay.min(self.config.max_delay_ms))
    }
}

impl RetryStrategyPlugin for NoDelayRetryPlugin {
    fn name(&self) -> &str {
        "none"
    }

    fn next_delay(&self, _attempt: u32, _error: &TaskError) -> Duration {
        Duration::ZERO
    }
}
