//! Configuration for walletscope operations
//!
//! This module provides the configuration controlling explorer access: the API
//! key, request timeout and rate limiting.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use walletscope::ExplorerConfig;
//!
//! // 15s timeout, 5 requests per second, no API key
//! let config = ExplorerConfig::default();
//! assert!(config.api_key.is_none());
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use walletscope::ExplorerConfigBuilder;
//! use std::time::Duration;
//!
//! let config = ExplorerConfigBuilder::new()
//!     .api_key("YourApiKeyToken")
//!     .request_timeout(Duration::from_secs(5))
//!     .rate_limit(2, Duration::from_secs(1))
//!     .build();
//! ```

use std::time::Duration;

pub mod constants;
pub mod networks;

use constants::{defaults, API_KEY_ENV};

/// Configuration for explorer access
///
/// Use [`ExplorerConfigBuilder`] for a fluent API to construct instances.
#[derive(Clone)]
pub struct ExplorerConfig {
    /// Explorer API key. Requests fail with a configuration error without it.
    pub api_key: Option<String>,

    /// Timeout for each HTTP request
    /// Default: 15 seconds
    pub request_timeout: Duration,

    /// Requests admitted per rate-limit window
    /// Default: 5
    pub rate_limit_requests: u32,

    /// Rate-limit window
    /// Default: 1 second
    pub rate_limit_window: Duration,
}

impl std::fmt::Debug for ExplorerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .finish()
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            request_timeout: defaults::REQUEST_TIMEOUT,
            rate_limit_requests: defaults::RATE_LIMIT_REQUESTS,
            rate_limit_window: defaults::RATE_LIMIT_WINDOW,
        }
    }
}

impl ExplorerConfig {
    /// Defaults with the API key taken from `ETHERSCAN_API_KEY`.
    ///
    /// An unset or blank variable leaves the key empty; the error surfaces on
    /// the first request instead.
    pub fn from_env() -> Self {
        Self {
            api_key: api_key_from_env(),
            ..Self::default()
        }
    }

    /// Whether a non-blank API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Builder for [`ExplorerConfig`]
///
/// # Example
///
/// ```rust
/// use walletscope::ExplorerConfigBuilder;
/// use std::time::Duration;
///
/// let config = ExplorerConfigBuilder::from_env()
///     .rate_limit(5, Duration::from_secs(1))
///     .build();
/// assert_eq!(config.rate_limit_requests, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExplorerConfigBuilder {
    config: ExplorerConfig,
}

impl ExplorerConfigBuilder {
    /// Create a new builder with defaults and no API key
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from [`ExplorerConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            config: ExplorerConfig::from_env(),
        }
    }

    /// Set the explorer API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the per-request HTTP timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the rate limit as `requests` per `window`
    pub fn rate_limit(mut self, requests: u32, window: Duration) -> Self {
        self.config.rate_limit_requests = requests;
        self.config.rate_limit_window = window;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ExplorerConfig {
        self.config
    }
}
