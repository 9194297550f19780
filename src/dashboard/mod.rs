// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet dashboard queries.
//!
//! [`WalletDashboard`] binds the explorer client to one [`QueryCache`] per
//! query kind and exposes the three dashboard reads in three flavors:
//!
//! - `balance` / `eth_price` / `transactions`: immediate snapshot, starting a
//!   background fetch when needed
//! - `fetch_*`: wait for a settled result
//! - `watch_*`: a polling [`QuerySubscription`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use walletscope::{BlockExplorerClient, ExplorerConfig, WalletDashboard, WalletState};
//!
//! # async fn example() -> Result<(), walletscope::AppError> {
//! let explorer = Arc::new(BlockExplorerClient::new(ExplorerConfig::from_env())?);
//! let dashboard = WalletDashboard::new(explorer);
//! let wallet = WalletState::connected("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", 1);
//!
//! let balance = dashboard.fetch_balance(&wallet).await;
//! if let Some(balance) = balance.data {
//!     println!("{} ETH", balance.formatted);
//! }
//! # Ok(())
//! # }
//! ```

mod native;

pub use native::{NativeBalanceSource, RpcBalanceSource};

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{QueryCache, QueryKey, QueryOptions, QueryState, QuerySubscription};
use crate::config::constants::{cadence, defaults};
use crate::errors::AppError;
use crate::explorer::transform::ProcessedTransaction;
use crate::explorer::types::EthPrice;
use crate::explorer::BlockExplorerClient;
use crate::format::format_usd_value;
use crate::transport::RetryPolicy;
use crate::types::wei::WeiAmount;

const BALANCE_QUERY: &str = "balance";
const PRICE_QUERY: &str = "eth_price";
const TRANSACTIONS_QUERY: &str = "transactions";

/// The connected wallet, as reported by the wallet connector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalletState {
    /// Account address, if any
    pub address: Option<String>,
    /// Whether a wallet is connected
    pub is_connected: bool,
    /// Active chain id
    pub chain_id: u64,
}

impl WalletState {
    /// A connected wallet.
    pub fn connected(address: impl Into<String>, chain_id: u64) -> Self {
        Self {
            address: Some(address.into()),
            is_connected: true,
            chain_id,
        }
    }

    /// No wallet.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// The address, if connected and well-formed.
    pub fn account(&self) -> Option<Address> {
        if !self.is_connected {
            return None;
        }
        let raw = self.address.as_deref()?;
        match Address::from_str(raw) {
            Ok(address) if raw.starts_with("0x") => Some(address),
            _ => {
                debug!(address = raw, "Ignoring malformed wallet address");
                None
            }
        }
    }
}

/// Native balance with its USD equivalent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Exact ether amount as a decimal string
    pub formatted: String,
    /// Amount in wei
    pub value: WeiAmount,
    /// USD value, `None` while the price is unavailable
    pub usd: Option<f64>,
}

impl Balance {
    /// Combine a balance with an optional price.
    pub fn new(value: WeiAmount, price: Option<&EthPrice>) -> Self {
        Self {
            formatted: value.formatted(),
            value,
            usd: price.map(|price| value.to_ether() * price.price),
        }
    }

    /// USD value for display, e.g. `$1,234.56`.
    pub fn formatted_usd(&self, price: &EthPrice) -> String {
        format_usd_value(self.value.to_ether(), price.price)
    }
}

/// Outcome of a dashboard query as seen by the presentation layer.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    /// The value, if any
    pub data: Option<T>,
    /// The last failure, if any
    pub error: Option<AppError>,
    /// Fetching with nothing to show yet
    pub is_loading: bool,
    /// Whether `error` is set
    pub is_error: bool,
    /// Whether a fetch is in flight
    pub is_fetching: bool,
}

impl<T> QueryResult<T> {
    /// A query that does not run (no wallet, malformed address).
    pub fn disabled() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_error: false,
            is_fetching: false,
        }
    }

    /// A settled query.
    pub fn settled(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                ..Self::disabled()
            },
            Err(error) => Self {
                data: None,
                error: Some(error),
                is_error: true,
                ..Self::disabled()
            },
        }
    }

    /// A settled query with a constant value.
    pub fn ready(data: T) -> Self {
        Self::settled(Ok(data))
    }

    /// Map the value, keeping the flags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(f),
            error: self.error,
            is_loading: self.is_loading,
            is_error: self.is_error,
            is_fetching: self.is_fetching,
        }
    }
}

impl<T> From<QueryState<T>> for QueryResult<T> {
    fn from(state: QueryState<T>) -> Self {
        Self {
            is_loading: state.is_loading(),
            is_error: state.is_error(),
            is_fetching: state.is_fetching,
            data: state.value,
            error: state.error,
        }
    }
}

/// Caching and sizing of the dashboard queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Balance query; polled every 10s
    pub balance: QueryOptions,
    /// ETH price query; fresh and polled for 60s, kept for an hour
    pub price: QueryOptions,
    /// Transaction history query; fresh and polled for 30s, kept for 5min
    pub transactions: QueryOptions,
    /// Transactions surfaced after filtering
    pub transaction_limit: usize,
    /// `txlist` page size
    pub txlist_offset: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            balance: QueryOptions::default().with_refetch_interval(cadence::BALANCE_REFRESH),
            price: QueryOptions::default()
                .with_stale_time(cadence::PRICE_REFRESH)
                .with_refetch_interval(cadence::PRICE_REFRESH)
                .with_gc_time(cadence::PRICE_GC)
                .with_retry(RetryPolicy::with_max_retries(3)),
            transactions: QueryOptions::default()
                .with_stale_time(cadence::TRANSACTIONS_REFRESH)
                .with_refetch_interval(cadence::TRANSACTIONS_REFRESH)
                .with_gc_time(cadence::TRANSACTIONS_GC),
            transaction_limit: defaults::TRANSACTION_LIMIT,
            txlist_offset: defaults::TXLIST_OFFSET,
        }
    }
}

/// The dashboard's query surface.
///
/// Cloning is cheap; clones share caches.
#[derive(Clone)]
pub struct WalletDashboard {
    explorer: Arc<BlockExplorerClient>,
    fallback: Option<Arc<dyn NativeBalanceSource>>,
    options: DashboardOptions,
    balances: QueryCache<WeiAmount>,
    prices: QueryCache<EthPrice>,
    transactions: QueryCache<Vec<ProcessedTransaction>>,
}

impl std::fmt::Debug for WalletDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletDashboard")
            .field("explorer", &self.explorer)
            .field("has_fallback", &self.fallback.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl WalletDashboard {
    /// Dashboard with default options and no balance fallback.
    pub fn new(explorer: Arc<BlockExplorerClient>) -> Self {
        Self::with_options(explorer, DashboardOptions::default())
    }

    /// Dashboard with explicit options.
    pub fn with_options(explorer: Arc<BlockExplorerClient>, options: DashboardOptions) -> Self {
        Self {
            explorer,
            fallback: None,
            options,
            balances: QueryCache::new(),
            prices: QueryCache::new(),
            transactions: QueryCache::new(),
        }
    }

    /// Read balances from `source` when the explorer is misconfigured.
    pub fn with_balance_fallback(mut self, source: Arc<dyn NativeBalanceSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    /// Active options.
    pub fn options(&self) -> &DashboardOptions {
        &self.options
    }

    /// Evict idle entries from every cache. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        self.balances.collect_garbage()
            + self.prices.collect_garbage()
            + self.transactions.collect_garbage()
    }

    // ----- balance -----

    fn balance_key(chain_id: u64, address: Address) -> QueryKey {
        QueryKey::new(BALANCE_QUERY).with(address).with(chain_id)
    }

    fn balance_producer(
        &self,
        chain_id: u64,
        address: Address,
    ) -> impl Fn() -> BoxFuture<'static, Result<WeiAmount, AppError>>
           + Send
           + Sync
           + 'static {
        let explorer = Arc::clone(&self.explorer);
        let fallback = self.fallback.clone();
        move || {
            let explorer = Arc::clone(&explorer);
            let fallback = fallback.clone();
            async move {
                match explorer.balance(chain_id, address).await {
                    Err(error @ AppError::Config { .. }) => match fallback {
                        Some(source) => {
                            info!(error = %error, "Explorer unavailable, reading balance over RPC");
                            source.native_balance(chain_id, address).await
                        }
                        None => Err(error),
                    },
                    other => other,
                }
            }
            .boxed()
        }
    }

    fn combine_balance(
        balance: QueryResult<WeiAmount>,
        price: &QueryResult<EthPrice>,
    ) -> QueryResult<Balance> {
        let usable_price = price.data.as_ref().filter(|_| !price.is_error);
        let price_error = price.error.clone();
        let mut combined = balance.map(|wei| Balance::new(wei, usable_price));
        if combined.error.is_none() {
            combined.error = price_error;
        }
        combined.is_error = combined.error.is_some();
        combined
    }

    /// Snapshot of the wallet balance and its USD value.
    ///
    /// `data` is `None` for a disconnected wallet or a malformed address;
    /// `usd` is `None` while the price is unavailable.
    pub fn balance(&self, wallet: &WalletState) -> QueryResult<Balance> {
        let Some(address) = wallet.account() else {
            return QueryResult::disabled();
        };
        let chain_id = wallet.chain_id;

        let balance = self.balances.get(
            &Self::balance_key(chain_id, address),
            self.balance_producer(chain_id, address),
            &self.options.balance,
        );
        Self::combine_balance(balance.into(), &self.eth_price())
    }

    /// Settled wallet balance and its USD value.
    pub async fn fetch_balance(&self, wallet: &WalletState) -> QueryResult<Balance> {
        let Some(address) = wallet.account() else {
            return QueryResult::disabled();
        };
        let chain_id = wallet.chain_id;

        let balance_key = Self::balance_key(chain_id, address);
        let (balance, price) = futures::join!(
            self.balances.fetch(
                &balance_key,
                self.balance_producer(chain_id, address),
                &self.options.balance,
            ),
            self.fetch_eth_price(),
        );
        Self::combine_balance(QueryResult::settled(balance), &price)
    }

    /// Poll the raw wallet balance every `options.balance.refetch_interval`.
    ///
    /// `None` for a disconnected wallet or a malformed address.
    pub fn watch_balance(&self, wallet: &WalletState) -> Option<QuerySubscription<WeiAmount>> {
        let address = wallet.account()?;
        let chain_id = wallet.chain_id;
        Some(self.balances.subscribe(
            &Self::balance_key(chain_id, address),
            self.balance_producer(chain_id, address),
            &self.options.balance,
        ))
    }

    // ----- ETH price -----

    fn price_key() -> QueryKey {
        QueryKey::new(PRICE_QUERY)
    }

    fn price_producer(
        &self,
    ) -> impl Fn() -> BoxFuture<'static, Result<EthPrice, AppError>>
           + Send
           + Sync
           + 'static {
        let explorer = Arc::clone(&self.explorer);
        move || {
            let explorer = Arc::clone(&explorer);
            async move { explorer.eth_price().await }.boxed()
        }
    }

    /// Snapshot of the ETH/USD price. Failures are always typed errors.
    pub fn eth_price(&self) -> QueryResult<EthPrice> {
        self.prices
            .get(&Self::price_key(), self.price_producer(), &self.options.price)
            .into()
    }

    /// Settled ETH/USD price.
    pub async fn fetch_eth_price(&self) -> QueryResult<EthPrice> {
        QueryResult::settled(
            self.prices
                .fetch(&Self::price_key(), self.price_producer(), &self.options.price)
                .await,
        )
    }

    /// Poll the ETH/USD price every `options.price.refetch_interval`.
    pub fn watch_eth_price(&self) -> QuerySubscription<EthPrice> {
        self.prices
            .subscribe(&Self::price_key(), self.price_producer(), &self.options.price)
    }

    // ----- transactions -----

    fn transactions_key(chain_id: u64, address: Address) -> QueryKey {
        QueryKey::new(TRANSACTIONS_QUERY).with(address).with(chain_id)
    }

    fn transactions_producer(
        &self,
        chain_id: u64,
        address: Address,
    ) -> impl Fn() -> BoxFuture<'static, Result<Vec<ProcessedTransaction>, AppError>>
           + Send
           + Sync
           + 'static {
        let explorer = Arc::clone(&self.explorer);
        let offset = self.options.txlist_offset;
        let limit = self.options.transaction_limit;
        move || {
            let explorer = Arc::clone(&explorer);
            async move {
                explorer
                    .recent_transactions(chain_id, address, offset, limit)
                    .await
            }
            .boxed()
        }
    }

    /// Snapshot of the recent transactions, newest first.
    ///
    /// Empty and settled for a disconnected wallet.
    pub fn transactions(&self, wallet: &WalletState) -> QueryResult<Vec<ProcessedTransaction>> {
        let Some(address) = wallet.account() else {
            return QueryResult::ready(Vec::new());
        };
        let chain_id = wallet.chain_id;

        self.transactions
            .get(
                &Self::transactions_key(chain_id, address),
                self.transactions_producer(chain_id, address),
                &self.options.transactions,
            )
            .into()
    }

    /// Settled recent transactions, newest first.
    pub async fn fetch_transactions(
        &self,
        wallet: &WalletState,
    ) -> QueryResult<Vec<ProcessedTransaction>> {
        let Some(address) = wallet.account() else {
            return QueryResult::ready(Vec::new());
        };
        let chain_id = wallet.chain_id;

        QueryResult::settled(
            self.transactions
                .fetch(
                    &Self::transactions_key(chain_id, address),
                    self.transactions_producer(chain_id, address),
                    &self.options.transactions,
                )
                .await,
        )
    }

    /// Poll the recent transactions every `options.transactions.refetch_interval`.
    ///
    /// `None` for a disconnected wallet or a malformed address.
    pub fn watch_transactions(
        &self,
        wallet: &WalletState,
    ) -> Option<QuerySubscription<Vec<ProcessedTransaction>>> {
        let address = wallet.account()?;
        let chain_id = wallet.chain_id;
        Some(self.transactions.subscribe(
            &Self::transactions_key(chain_id, address),
            self.transactions_producer(chain_id, address),
            &self.options.transactions,
        ))
    }
}
