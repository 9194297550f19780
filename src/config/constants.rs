// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known explorer constants
//!
//! This module centralizes magic strings and default values used throughout the
//! walletscope crate.

use std::time::Duration;

/// Environment variable holding the explorer API key.
pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Message the explorer returns with status `"0"` for an address with no history.
///
/// This is a successful empty result, not an error.
pub const NO_TRANSACTIONS_FOUND: &str = "No transactions found";

/// Successful envelope status.
pub const STATUS_OK: &str = "1";

/// Failed (or empty) envelope status.
pub const STATUS_FAILED: &str = "0";

/// Explorer request defaults
pub mod defaults {
    use super::*;

    /// Per-request HTTP timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// Requests admitted per rate-limit window.
    pub const RATE_LIMIT_REQUESTS: u32 = 5;

    /// Rate-limit window.
    pub const RATE_LIMIT_WINDOW: Duration = Duration::from_millis(1_000);

    /// Transactions surfaced to the dashboard after filtering.
    pub const TRANSACTION_LIMIT: usize = 5;

    /// `offset` (page size) sent with `txlist`.
    pub const TXLIST_OFFSET: u32 = 10;

    /// `endblock` sent with `txlist`.
    pub const TXLIST_END_BLOCK: u64 = 99_999_999;
}

/// Polling and caching cadence for the dashboard queries
pub mod cadence {
    use super::*;

    /// Balance polling interval.
    pub const BALANCE_REFRESH: Duration = Duration::from_secs(10);

    /// ETH price polling interval and staleness.
    pub const PRICE_REFRESH: Duration = Duration::from_secs(60);

    /// ETH price cache lifetime once unobserved.
    pub const PRICE_GC: Duration = Duration::from_secs(60 * 60);

    /// Transaction history polling interval and staleness.
    pub const TRANSACTIONS_REFRESH: Duration = Duration::from_secs(30);

    /// Transaction history cache lifetime once unobserved.
    pub const TRANSACTIONS_GC: Duration = Duration::from_secs(5 * 60);
}
