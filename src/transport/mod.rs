// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transport layer for explorer requests.
//!
//! Explorer calls flow through a boxed [`tower::Service`] so the HTTP stack can
//! be replaced in tests with a `tower::service_fn` fake. The production stack
//! is [`HttpTransport`] wrapped in [`LoggingLayer`].
//!
//! # Rate Limiting
//!
//! [`RateLimiter`] admits at most N requests per window and rejects the rest
//! with the time to wait. It never sleeps; the explorer client turns a
//! rejection into [`AppError::RateLimit`](crate::AppError::RateLimit).
//!
//! # Retries
//!
//! [`RetryPolicy`] drives exponential backoff for the query cache.
//!
//! ## Usage
//!
//! ```rust
//! use walletscope::transport::{ExplorerTransport, HttpTransport, LoggingLayer};
//! use std::time::Duration;
//! use tower::Layer;
//!
//! let http = HttpTransport::new(Duration::from_secs(15))?;
//! let transport = ExplorerTransport::new(LoggingLayer::new().layer(http));
//! # Ok::<(), walletscope::AppError>(())
//! ```

mod http;
mod logging;
mod rate_limit;
mod retry;

pub use http::HttpTransport;
pub use logging::{LoggingLayer, LoggingService};
pub use rate_limit::{RateLimitOutcome, RateLimiter};
pub use retry::{RetryPolicy, RetryPolicyBuilder};

use crate::errors::AppError;
use crate::explorer::types::{ExplorerEnvelope, ExplorerRequest};

/// Type-erased explorer transport shared by every client clone.
pub type ExplorerTransport =
    tower::util::BoxCloneSyncService<ExplorerRequest, ExplorerEnvelope, AppError>;
