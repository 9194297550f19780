//! Span creation helpers for walletscope operations.
//!
//! This module provides span creation functions following an orthogonal design pattern
//! where telemetry concerns are separated from business logic. Instead of using
//! `#[instrument]` attributes directly on functions, each instrumented operation has
//! a corresponding span helper function in this module.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(span)
//!     .await
//! }
//! ```

use alloy_primitives::Address;
use tracing::{Level, Span};

/// Create span for a single explorer API request.
///
/// Parent: query_fetch span, or None when called directly
/// Children: explorer_call span of the logging layer
#[inline]
pub(crate) fn explorer_request(chain_id: u64, module: &str, action: &str) -> Span {
    tracing::debug_span!(
        "walletscope.explorer_request",
        chain_id = chain_id,
        module = module,
        action = action,
    )
}

/// Create span for one producer run of the query cache, retries included.
///
/// Parent: None (fetches run on their own task)
/// Children: explorer_request spans
#[inline]
pub(crate) fn query_fetch(key: &str, ticket: u64) -> Span {
    tracing::span!(
        Level::INFO,
        "walletscope.query_fetch",
        key = key,
        ticket = ticket,
    )
}

/// Create span for the polling loop of a query subscription.
///
/// Parent: None (polling runs on its own task)
/// Children: none; each tick spawns a detached query_fetch
#[inline]
pub(crate) fn query_poll(key: &str, interval_ms: u64) -> Span {
    tracing::debug_span!(
        "walletscope.query_poll",
        key = key,
        interval_ms = interval_ms,
    )
}

/// Create span for reading a native balance over JSON-RPC.
///
/// Parent: query_fetch span of the balance query
/// Children: RPC call to eth_getBalance
#[inline]
pub(crate) fn native_balance_fallback(chain_id: u64, address: Address) -> Span {
    tracing::info_span!(
        "walletscope.native_balance_fallback",
        chain_id = chain_id,
        address = %address,
    )
}
