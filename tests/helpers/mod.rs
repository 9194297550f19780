// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for walletscope integration tests
//!
//! Provides an in-memory explorer transport and canned explorer payloads so the
//! client, cache and dashboard can be exercised without network access.

#![allow(dead_code)]

pub mod backend;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{address, Address};
use serde_json::{json, Value};
use walletscope::{
    AppError, BlockExplorerClient, ExplorerConfig, ExplorerConfigBuilder, ExplorerEnvelope,
    ExplorerRequest, ExplorerTransport, RawTransaction,
};

/// Vitalik's address, used as the default wallet in tests
pub const WALLET: Address = address!("d8da6bf26964af9d7eed9e03e53415d37aa96045");

/// Checksummed form of [`WALLET`]
pub const WALLET_STR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

/// In-memory explorer transport
///
/// Every request is recorded and answered by the handler. The handler sees the
/// request and the 1-based call number.
///
/// # Example
///
/// ```rust,ignore
/// let fake = FakeExplorer::new(|req, _| match req.action.as_str() {
///     "balance" => Ok(ExplorerEnvelope::ok(json!("1000"))),
///     _ => Err(AppError::http(404)),
/// });
/// let client = fake.client();
/// ```
#[derive(Clone)]
pub struct FakeExplorer {
    handler: Arc<dyn Fn(&ExplorerRequest, usize) -> Result<ExplorerEnvelope, AppError> + Send + Sync>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ExplorerRequest>>>,
}

impl FakeExplorer {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ExplorerRequest, usize) -> Result<ExplorerEnvelope, AppError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers balance, txlist and ethprice with healthy defaults
    pub fn healthy() -> Self {
        Self::new(|req, _| Ok(default_response(req)))
    }

    /// Boxed transport answering through this fake
    pub fn transport(&self) -> ExplorerTransport {
        let fake = self.clone();
        ExplorerTransport::new(tower::service_fn(move |request: ExplorerRequest| {
            let n = fake.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let response = (fake.handler)(&request, n);
            fake.requests.lock().unwrap().push(request);
            std::future::ready(response)
        }))
    }

    /// Client with an API key and a limiter that never gets in the way
    pub fn client(&self) -> BlockExplorerClient {
        self.client_with(test_config())
    }

    pub fn client_with(&self, config: ExplorerConfig) -> BlockExplorerClient {
        BlockExplorerClient::with_transport(config, self.transport())
    }

    /// Number of requests that reached the transport
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of requests for `module.action`
    pub fn calls_to(&self, label: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|req| req.label() == label)
            .count()
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<ExplorerRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Config with a key and 1000 requests per second
pub fn test_config() -> ExplorerConfig {
    ExplorerConfigBuilder::new()
        .api_key("test-key")
        .rate_limit(1000, Duration::from_secs(1))
        .build()
}

/// Query parameter of a recorded request
pub fn query_param(request: &ExplorerRequest, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Healthy response for the three dashboard actions
pub fn default_response(request: &ExplorerRequest) -> ExplorerEnvelope {
    match request.action.as_str() {
        "balance" => ExplorerEnvelope::ok(json!("1500000000000000000")),
        "txlist" => ExplorerEnvelope::ok(txlist(10, &[1, 4, 7])),
        "ethprice" => ExplorerEnvelope::ok(eth_price_result("2000.00", "1700000000")),
        _ => ExplorerEnvelope::failed("NOTOK", json!("Error! Missing Or invalid Action name")),
    }
}

pub fn eth_price_result(ethusd: &str, timestamp: &str) -> Value {
    json!({
        "ethbtc": "0.05",
        "ethbtc_timestamp": timestamp,
        "ethusd": ethusd,
        "ethusd_timestamp": timestamp,
    })
}

/// A valid raw record; `index` makes the hash unique and sets the timestamp
pub fn raw_tx(index: u8, failed: bool) -> RawTransaction {
    RawTransaction {
        block_number: (19_000_000 + u64::from(index)).to_string(),
        time_stamp: (1_700_000_000 - u64::from(index) * 60).to_string(),
        hash: format!("0x{}", format!("{index:02x}").repeat(32)),
        nonce: index.to_string(),
        block_hash: format!("0x{}", "ab".repeat(32)),
        transaction_index: "0".to_string(),
        from: WALLET_STR.to_lowercase(),
        to: "0x0000000000000000000000000000000000000001".to_string(),
        value: "1000000000000000000".to_string(),
        gas: "21000".to_string(),
        gas_price: "30000000000".to_string(),
        is_error: if failed { "1" } else { "0" }.to_string(),
        txreceipt_status: if failed { "0" } else { "1" }.to_string(),
        input: "0x".to_string(),
        contract_address: Some(String::new()),
        cumulative_gas_used: "21000".to_string(),
        gas_used: "21000".to_string(),
        confirmations: "12".to_string(),
        method_id: Some("0x".to_string()),
        function_name: Some(String::new()),
    }
}

/// `count` records newest first, with `failed` indices marked isError=1
pub fn raw_txs(count: u8, failed: &[u8]) -> Vec<RawTransaction> {
    (0..count).map(|i| raw_tx(i, failed.contains(&i))).collect()
}

/// txlist `result` payload as the explorer sends it
pub fn txlist(count: u8, failed: &[u8]) -> Value {
    serde_json::to_value(raw_txs(count, failed)).unwrap()
}
