// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Keys, options and snapshots of the query cache.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::AppError;
use crate::transport::RetryPolicy;

/// Identity of a cached query: a name plus its parameters.
///
/// ```
/// use walletscope::QueryKey;
///
/// let key = QueryKey::new("transactions").with("0xabc").with(1);
/// assert_eq!(key.to_string(), "transactions:0xabc:1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    name: String,
    params: Vec<String>,
}

impl QueryKey {
    /// Key with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter.
    pub fn with(mut self, param: impl fmt::Display) -> Self {
        self.params.push(param.to_string());
        self
    }

    /// Query name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query parameters in insertion order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

/// Lifecycle of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Never fetched
    Idle,
    /// A fetch is in flight; any previous value stays visible
    Fetching,
    /// Holds a value younger than `stale_time`
    Fresh,
    /// Holds a value that should be refetched on next access
    Stale,
    /// The last fetch failed after exhausting retries
    Failed,
}

/// Per-query caching behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a value stays fresh. Zero means stale immediately.
    pub stale_time: Duration,
    /// Polling interval while subscribed
    pub refetch_interval: Option<Duration>,
    /// How long an unobserved entry is kept before garbage collection
    pub gc_time: Duration,
    /// Retry behavior of each fetch
    pub retry: RetryPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            refetch_interval: None,
            gc_time: Duration::from_secs(5 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

impl QueryOptions {
    /// Set how long values stay fresh
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Poll every `interval` while subscribed
    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    /// Set how long unobserved entries survive
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Point-in-time view of a cached query.
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    /// Last successfully fetched value
    pub value: Option<V>,
    /// Error of the last fetch, cleared by the next success
    pub error: Option<AppError>,
    /// Lifecycle status
    pub status: QueryStatus,
    /// Whether a fetch is in flight
    pub is_fetching: bool,
    /// When `value` was fetched
    pub updated_at: Option<Instant>,
}

impl<V> QueryState<V> {
    /// State of a key that was never requested.
    pub fn idle() -> Self {
        Self {
            value: None,
            error: None,
            status: QueryStatus::Idle,
            is_fetching: false,
            updated_at: None,
        }
    }

    /// Fetching with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.is_fetching && self.value.is_none()
    }

    /// The last fetch failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// A value is available.
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self::idle()
    }
}
