// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed-window request admission control.
//!
//! The limiter keeps a log of admission instants. A check prunes instants older
//! than the window, then either admits (recording the instant) or rejects with
//! the time until the oldest instant leaves the window. Rejection never waits
//! and never records anything: the caller decides what to do with the wait.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Result of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// The request may proceed; its instant has been recorded.
    Admitted,
    /// The window is full.
    Rejected {
        /// Time until the oldest recorded request expires
        wait: Duration,
    },
}

impl RateLimitOutcome {
    /// Whether the request was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateLimitOutcome::Admitted)
    }
}

/// Sliding-log rate limiter over a fixed window.
///
/// Check-and-record happens under a single mutex, so the window invariant holds
/// no matter how many tasks or threads call [`check`](Self::check) concurrently.
///
/// # Example
///
/// ```rust
/// use walletscope::transport::{RateLimitOutcome, RateLimiter};
/// use std::time::Duration;
///
/// // Allow 5 requests per second
/// let limiter = RateLimiter::new(5, Duration::from_secs(1));
///
/// for _ in 0..5 {
///     assert_eq!(limiter.check(), RateLimitOutcome::Admitted);
/// }
/// assert!(!limiter.check().is_admitted());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    ///
    /// # Arguments
    ///
    /// * `max_requests` - Maximum number of requests admitted per window (at least 1)
    /// * `window` - Length of the window (at least 1ms)
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1) as usize;
        Self {
            max_requests,
            window: window.max(Duration::from_millis(1)),
            requests: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Creates a rate limiter from requests per second.
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// Admit or reject one request.
    pub fn check(&self) -> RateLimitOutcome {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some(oldest) = requests.front() {
            if now.duration_since(*oldest) < self.window {
                break;
            }
            requests.pop_front();
        }

        if requests.len() >= self.max_requests {
            // Non-empty: max_requests is at least 1
            let oldest = requests.front().copied().unwrap_or(now);
            let wait = self.window.saturating_sub(now.duration_since(oldest));
            return RateLimitOutcome::Rejected { wait };
        }

        requests.push_back(now);
        RateLimitOutcome::Admitted
    }

    /// Forget every recorded request.
    pub fn reset(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Maximum requests per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}
