// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Retry policy with exponential backoff.
//!
//! The backoff formula is:
//!
//! ```text
//! delay = min(base_delay * 2^attempt, max_delay)
//! ```
//!
//! Only errors whose metadata marks them retryable are retried (see
//! [`AppError::is_retryable`]); everything else fails on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::AppError;

/// Default maximum number of retry attempts.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default maximum delay between retries (30 seconds).
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Retry configuration for a query.
///
/// # Example
///
/// ```rust
/// use walletscope::transport::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200))
///     .max_delay(Duration::from_secs(10))
///     .build();
///
/// assert_eq!(policy.max_attempts(), 6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial request).
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Default policy: 3 retries, 1s base delay, 30s cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Default delays with a specific number of retries.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Creates a builder starting from the default policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Total attempts including the initial one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is spent.
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn retry<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(query = label, attempt = attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        debug!(
                            query = label,
                            kind = %error.kind(),
                            error = %error,
                            "Non-retryable error, not retrying"
                        );
                        return Err(error);
                    }

                    if attempt >= self.max_retries {
                        warn!(
                            query = label,
                            error = %error,
                            attempts = attempt + 1,
                            "Max retries exceeded"
                        );
                        return Err(error);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        query = label,
                        error = %error,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable error, backing off"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Builder for configuring a [`RetryPolicy`].
#[derive(Clone, Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retry attempts (not including the initial request).
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Sets the base delay for exponential backoff.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Builds the configured [`RetryPolicy`].
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Calculates the backoff duration for a given attempt.
///
/// Uses exponential backoff: `min(base_delay * 2^attempt, max_delay)`
fn calculate_backoff(attempt: u32, policy: &RetryPolicy) -> Duration {
    let multiplier = 2u64.saturating_pow(attempt);
    let delay_ms = policy
        .base_delay
        .as_millis()
        .saturating_mul(multiplier as u128);
    let capped_delay_ms = delay_ms.min(policy.max_delay.as_millis()) as u64;
    Duration::from_millis(capped_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.base_delay, Duration::from_millis(DEFAULT_BASE_DELAY_MS));
        assert_eq!(policy.max_delay, Duration::from_millis(DEFAULT_MAX_DELAY_MS));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::builder()
            .max_retries(5)
            .base_delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(60))
            .build();

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_retry_policy_presets() {
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert_eq!(RetryPolicy::with_max_retries(10).max_retries, 10);
    }

    #[test]
    fn test_calculate_backoff() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        };

        assert_eq!(calculate_backoff(0, &policy), Duration::from_millis(100));
        assert_eq!(calculate_backoff(1, &policy), Duration::from_millis(200));
        assert_eq!(calculate_backoff(2, &policy), Duration::from_millis(400));
        assert_eq!(calculate_backoff(3, &policy), Duration::from_millis(800));
    }

    #[test]
    fn test_calculate_backoff_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(calculate_backoff(3, &policy), Duration::from_millis(500));
        assert_eq!(calculate_backoff(10, &policy), Duration::from_millis(500));
    }

    #[test]
    fn test_calculate_backoff_overflow_protection() {
        let policy = RetryPolicy {
            max_retries: 100,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        };

        assert_eq!(calculate_backoff(50, &policy), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_on_non_retryable() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::new()
            .retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::config("missing key"))
            })
            .await;

        assert!(matches!(result, Err(AppError::Config { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_budget_on_retryable() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::with_max_retries(2)
            .retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::network("connection reset"))
            })
            .await;

        assert!(matches!(result, Err(AppError::Network { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::new()
            .retry("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::http(503))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
