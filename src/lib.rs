// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Request orchestration for wallet dashboards.
//!
//! - [`BlockExplorerClient`]: rate-limited Etherscan-style client for balances,
//!   transaction history and the ETH/USD price
//! - [`AppError`]: one error type with a fixed classification table
//!   ([`classify`] turns any failure into one)
//! - [`QueryCache`]: keyed async cache with staleness, retries, request
//!   de-duplication, polling and garbage collection
//! - [`transform`]: validation and bounding of raw transaction records
//! - [`WalletDashboard`]: the three dashboard queries on top of all of the above
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use walletscope::{BlockExplorerClient, ExplorerConfig, WalletDashboard, WalletState};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), walletscope::AppError> {
//! let explorer = Arc::new(BlockExplorerClient::new(ExplorerConfig::from_env())?);
//! let dashboard = WalletDashboard::new(explorer);
//! let wallet = WalletState::connected("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", 1);
//!
//! let transactions = dashboard.fetch_transactions(&wallet).await;
//! for tx in transactions.data.unwrap_or_default() {
//!     println!("{} {}", tx.hash, tx.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod explorer;
pub mod format;
mod spans;
pub mod transport;
pub mod types;

pub use cache::{
    QueryCache, QueryFuture, QueryKey, QueryOptions, QueryState, QueryStatus, QuerySubscription,
};
pub use config::networks::{format_short, NetworkConfig, Networks};
pub use config::{ExplorerConfig, ExplorerConfigBuilder};
pub use dashboard::{
    Balance, DashboardOptions, NativeBalanceSource, QueryResult, RpcBalanceSource,
    WalletDashboard, WalletState,
};
pub use errors::{classify, report, AppError, ErrorKind, ErrorMetadata, Failure};
pub use explorer::transform::{transform, ProcessedTransaction};
pub use explorer::types::{EthPrice, ExplorerEnvelope, ExplorerRequest, RawTransaction};
pub use explorer::BlockExplorerClient;
pub use format::{format_eth_value, format_usd_value};
pub use transport::{
    ExplorerTransport, HttpTransport, LoggingLayer, RateLimitOutcome, RateLimiter, RetryPolicy,
    RetryPolicyBuilder,
};
pub use types::wei::WeiAmount;
