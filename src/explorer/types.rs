// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Wire types for the Etherscan-style explorer API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::constants::{STATUS_FAILED, STATUS_OK};

/// One outbound explorer call.
///
/// `url` is complete, including the API key, so it must never be logged; use
/// [`label`](Self::label) and [`endpoint`](Self::endpoint) instead.
#[derive(Debug, Clone)]
pub struct ExplorerRequest {
    /// Fully-encoded request URL
    pub url: Url,
    /// Explorer `module` parameter
    pub module: String,
    /// Explorer `action` parameter
    pub action: String,
}

impl ExplorerRequest {
    /// `module.action`, for logs and spans.
    pub fn label(&self) -> String {
        format!("{}.{}", self.module, self.action)
    }

    /// Scheme, host and path without the query string.
    pub fn endpoint(&self) -> String {
        format!(
            "{}://{}{}",
            self.url.scheme(),
            self.url.host_str().unwrap_or_default(),
            self.url.path()
        )
    }
}

/// The `{status, message, result}` envelope every explorer response uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerEnvelope {
    /// `"1"` on success, `"0"` on failure or empty result
    pub status: String,
    /// `"OK"`, `"NOTOK"`, `"No transactions found"`, ...
    pub message: String,
    /// Payload; a string, an array or an object depending on the action
    #[serde(default)]
    pub result: serde_json::Value,
}

impl ExplorerEnvelope {
    /// A successful envelope carrying `result`.
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message: "OK".to_string(),
            result,
        }
    }

    /// A status `"0"` envelope.
    pub fn failed(message: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            status: STATUS_FAILED.to_string(),
            message: message.into(),
            result,
        }
    }
}

/// A transaction record as returned by `module=account&action=txlist`.
///
/// Every numeric field is a decimal string on the wire; validation happens in
/// [`transform`](crate::explorer::transform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub block_hash: String,
    #[serde(default)]
    pub transaction_index: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub gas: String,
    pub gas_price: String,
    pub is_error: String,
    #[serde(default, rename = "txreceipt_status")]
    pub txreceipt_status: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub cumulative_gas_used: String,
    pub gas_used: String,
    pub confirmations: String,
    #[serde(default)]
    pub method_id: Option<String>,
    #[serde(default)]
    pub function_name: Option<String>,
}

/// Result object of `module=stats&action=ethprice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthPriceResult {
    /// ETH/USD as a decimal string
    pub ethusd: String,
    /// ETH/BTC as a decimal string
    pub ethbtc: String,
    /// Unix seconds of the USD quote
    pub ethusd_timestamp: String,
}

/// Validated ETH/USD quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EthPrice {
    /// USD per ETH, always positive
    pub price: f64,
    /// When the explorer last updated the quote
    pub last_update: DateTime<Utc>,
}
