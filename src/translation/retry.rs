/*!
 * Retry with exponential backoff.
 *
 * `RetryPolicy` decides how often and how long to wait; it does no logging.
 * Each scheduled retry is reported to a caller-supplied observer instead.
 */

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::app_config::TranslationCommonConfig;
use crate::errors::ProviderError;

/// Details of a retry about to happen
#[derive(Debug, Clone)]
pub struct RetryEvent<'a> {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Delay before the next attempt
    pub delay: Duration,
    /// Error of the failed attempt
    pub error: &'a ProviderError,
}

/// Receives retry notifications
pub trait RetryObserver: Send + Sync {
    /// Called before sleeping ahead of the next attempt
    fn on_retry(&self, event: &RetryEvent<'_>);
}

impl<F> RetryObserver for F
where
    F: Fn(&RetryEvent<'_>) + Send + Sync,
{
    fn on_retry(&self, event: &RetryEvent<'_>) {
        self(event)
    }
}

/// Observer that ignores every event
pub struct SilentObserver;

impl RetryObserver for SilentObserver {
    fn on_retry(&self, _event: &RetryEvent<'_>) {}
}

/// Exponential backoff policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failure
    pub initial_delay: Duration,
    /// Upper bound on the delay before jitter
    pub max_delay: Duration,
    /// Extra multiplier for "too many requests" failures
    pub rate_limit_multiplier: u32,
    /// Maximum random jitter added to each delay
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Build a policy from configuration
    pub fn from_config(config: &TranslationCommonConfig) -> Self {
        Self {
            max_attempts: config.retry_count.max(1),
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            rate_limit_multiplier: config.rate_limit_backoff_multiplier.max(1),
            max_jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// Policy that tries once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rate_limit_multiplier: 1,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay after the `attempt`-th failure, before jitter
    pub fn base_delay(&self, attempt: u32, rate_limited: bool) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let mut delay = self.initial_delay.saturating_mul(1u32 << exponent);
        if rate_limited {
            delay = delay.saturating_mul(self.rate_limit_multiplier);
        }
        delay.min(self.max_delay)
    }

    /// Base delay plus a random jitter in `[0, max_jitter]`
    pub fn delay_with_jitter(&self, attempt: u32, rate_limited: bool) -> Duration {
        let base = self.base_delay(attempt, rate_limited);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    /// Run `operation` until it succeeds, fails permanently or attempts run out.
    ///
    /// The last error is returned when every attempt failed.
    pub async fn run<T, F, Fut>(&self, mut operation: F, observer: &dyn RetryObserver) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= max_attempts || !error.is_retryable() {
                        return Err(error);
                    }

                    let delay = self.delay_with_jitter(attempt, error.is_rate_limited());
                    observer.on_retry(&RetryEvent {
                        attempt,
                        max_attempts,
                        delay,
                        error: &error,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationCommonConfig::default())
    }
}
