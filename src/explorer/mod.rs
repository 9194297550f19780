// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Etherscan-style block explorer client.
//!
//! [`BlockExplorerClient`] resolves the network, consults the rate limiter,
//! attaches the API key, issues the request through the boxed transport and
//! normalizes the `{status, message, result}` envelope. Every failure leaves
//! this module as a classified [`AppError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use walletscope::{BlockExplorerClient, ExplorerConfig};
//! use alloy_primitives::address;
//!
//! # async fn example() -> Result<(), walletscope::AppError> {
//! let client = BlockExplorerClient::new(ExplorerConfig::from_env())?;
//! let owner = address!("d8da6bf26964af9d7eed9e03e53415d37aa96045");
//!
//! let balance = client.balance(1, owner).await?;
//! let recent = client.recent_transactions(1, owner, 10, 5).await?;
//! println!("{balance} across {} recent transactions", recent.len());
//! # Ok(())
//! # }
//! ```

pub mod transform;
pub mod types;

use alloy_primitives::Address;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::{Layer, ServiceExt};
use tracing::{debug, Instrument};
use url::Url;

use crate::config::constants::{defaults, NO_TRANSACTIONS_FOUND, STATUS_FAILED};
use crate::config::networks::Networks;
use crate::config::ExplorerConfig;
use crate::errors::AppError;
use crate::spans;
use crate::transport::{
    ExplorerTransport, HttpTransport, LoggingLayer, RateLimitOutcome, RateLimiter,
};
use crate::types::wei::WeiAmount;

use transform::{transform, ProcessedTransaction};
use types::{EthPrice, EthPriceResult, ExplorerEnvelope, ExplorerRequest, RawTransaction};

/// Client for the explorer API of every supported network.
///
/// One rate limiter is shared by all networks and all operations of a client.
pub struct BlockExplorerClient {
    config: ExplorerConfig,
    limiter: RateLimiter,
    transport: ExplorerTransport,
}

impl std::fmt::Debug for BlockExplorerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockExplorerClient")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl BlockExplorerClient {
    /// Client over HTTP with request logging.
    pub fn new(config: ExplorerConfig) -> Result<Self, AppError> {
        let http = HttpTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(config, LoggingLayer::new().layer(http)))
    }

    /// Client over a caller-supplied transport.
    pub fn with_transport<S>(config: ExplorerConfig, transport: S) -> Self
    where
        S: tower::Service<ExplorerRequest, Response = ExplorerEnvelope, Error = AppError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let limiter = RateLimiter::new(config.rate_limit_requests, config.rate_limit_window);
        Self {
            config,
            limiter,
            transport: ExplorerTransport::new(transport),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// The limiter guarding every request of this client.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Issue one explorer request and decode its `result` as `T`.
    ///
    /// `params` must include `module` and `action`; `apikey` is appended.
    ///
    /// # Errors
    ///
    /// In evaluation order:
    /// - [`AppError::UnsupportedNetwork`] for a chain outside the registry
    /// - [`AppError::RateLimit`] when the limiter rejects the request
    /// - [`AppError::Config`] without an API key, or when the explorer answers
    ///   status `"0"` with anything but "No transactions found"
    /// - [`AppError::Http`] / [`AppError::Network`] from the transport
    /// - [`AppError::Validation`] when `result` does not decode as `T`
    pub async fn request<T: DeserializeOwned>(
        &self,
        chain_id: u64,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let module = param(params, "module");
        let action = param(params, "action");
        let span = spans::explorer_request(chain_id, module, action);

        async move {
            let network = Networks::get(chain_id)?;

            if let RateLimitOutcome::Rejected { wait } = self.limiter.check() {
                debug!(wait_ms = wait.as_millis() as u64, "Rate limiter rejected request");
                return Err(AppError::rate_limit(wait));
            }

            let api_key = self
                .config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    AppError::config(
                        "Etherscan API key is not configured. Set ETHERSCAN_API_KEY",
                    )
                })?;

            let url = Url::parse_with_params(
                &format!("{}/api", network.api_url),
                params.iter().copied().chain([("apikey", api_key)]),
            )
            .map_err(|e| AppError::config(format!("Invalid explorer URL: {e}")))?;

            let request = ExplorerRequest {
                url,
                module: module.to_string(),
                action: action.to_string(),
            };
            let envelope = self.transport.clone().oneshot(request).await?;
            let result = normalize(envelope)?;

            serde_json::from_value(result).map_err(|e| {
                AppError::validation_with(format!("Unexpected {module}.{action} result"), e)
            })
        }
        .instrument(span)
        .await
    }

    /// Native balance of `address`.
    pub async fn balance(&self, chain_id: u64, address: Address) -> Result<WeiAmount, AppError> {
        let address = address.to_string();
        let wei: String = self
            .request(
                chain_id,
                &[
                    ("module", "account"),
                    ("action", "balance"),
                    ("address", &address),
                    ("tag", "latest"),
                ],
            )
            .await?;

        WeiAmount::parse(&wei)
    }

    /// Most recent `offset` transactions of `address`, newest first.
    ///
    /// An address without history yields an empty list.
    pub async fn transactions(
        &self,
        chain_id: u64,
        address: Address,
        offset: u32,
    ) -> Result<Vec<RawTransaction>, AppError> {
        let address = address.to_string();
        let offset = offset.to_string();
        let end_block = defaults::TXLIST_END_BLOCK.to_string();

        self.request(
            chain_id,
            &[
                ("module", "account"),
                ("action", "txlist"),
                ("address", &address),
                ("startblock", "0"),
                ("endblock", &end_block),
                ("page", "1"),
                ("offset", &offset),
                ("sort", "desc"),
            ],
        )
        .await
    }

    /// Fetch `offset` raw records, then validate and bound them to `limit`.
    pub async fn recent_transactions(
        &self,
        chain_id: u64,
        address: Address,
        offset: u32,
        limit: usize,
    ) -> Result<Vec<ProcessedTransaction>, AppError> {
        let raw = self.transactions(chain_id, address, offset).await?;
        transform(&raw, limit)
    }

    /// Current ETH/USD quote, always read from mainnet.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] when the price is unparsable or not positive,
    /// or the timestamp is not a valid Unix time.
    pub async fn eth_price(&self) -> Result<EthPrice, AppError> {
        let quote: EthPriceResult = self
            .request(
                Networks::mainnet().chain_id(),
                &[("module", "stats"), ("action", "ethprice")],
            )
            .await?;

        let price = quote
            .ethusd
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite() && *price > 0.0)
            .ok_or_else(|| AppError::validation(format!("Invalid ETH price: {:?}", quote.ethusd)))?;

        let last_update = quote
            .ethusd_timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "Invalid ETH price timestamp: {:?}",
                    quote.ethusd_timestamp
                ))
            })?;

        Ok(EthPrice { price, last_update })
    }
}

fn param<'a>(params: &[(&str, &'a str)], name: &str) -> &'a str {
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
        .unwrap_or_default()
}

/// Map an envelope to its `result`, or to the error it reports.
fn normalize(envelope: ExplorerEnvelope) -> Result<Value, AppError> {
    if envelope.status != STATUS_FAILED {
        return Ok(envelope.result);
    }

    if envelope.message == NO_TRANSACTIONS_FOUND {
        return Ok(Value::Array(Vec::new()));
    }

    let message = if envelope.message.is_empty() {
        "Unknown error"
    } else {
        envelope.message.as_str()
    };
    let detail = match &envelope.result {
        Value::String(text) if !text.is_empty() && text != message => {
            format!("{message}: {text}")
        }
        _ => message.to_string(),
    };

    Err(AppError::config(format!("Etherscan API Error: {detail}")))
}
