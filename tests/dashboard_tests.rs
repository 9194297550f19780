// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the wallet dashboard queries

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use helpers::{default_response, FakeExplorer, WALLET, WALLET_STR};
use serde_json::json;
use tokio::time::sleep;
use walletscope::{
    AppError, DashboardOptions, ErrorKind, ExplorerConfigBuilder, ExplorerEnvelope,
    NativeBalanceSource, WalletDashboard, WalletState, WeiAmount,
};

struct StaticBalance {
    wei: u64,
    calls: AtomicUsize,
}

#[async_trait]
impl NativeBalanceSource for StaticBalance {
    async fn native_balance(&self, _chain_id: u64, address: Address) -> Result<WeiAmount, AppError> {
        assert_eq!(address, WALLET);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(WeiAmount::from(self.wei))
    }
}

fn dashboard(fake: &FakeExplorer) -> WalletDashboard {
    WalletDashboard::new(Arc::new(fake.client()))
}

fn wallet() -> WalletState {
    WalletState::connected(WALLET_STR, 1)
}

#[tokio::test(start_paused = true)]
async fn test_fetch_balance_with_usd_value() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let result = dashboard.fetch_balance(&wallet()).await;

    assert!(!result.is_error, "{:?}", result.error);
    let balance = result.data.unwrap();
    assert_eq!(balance.formatted, "1.5");
    assert_eq!(balance.value, WeiAmount::new(U256::from(1_500_000_000_000_000_000u128)));
    assert_eq!(balance.usd, Some(3000.0));
    assert_eq!(fake.calls_to("account.balance"), 1);
    assert_eq!(fake.calls_to("stats.ethprice"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_wallet_makes_no_requests() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);
    let wallet = WalletState::disconnected();

    let balance = dashboard.balance(&wallet);
    assert!(balance.data.is_none());
    assert!(!balance.is_loading && !balance.is_error);

    let transactions = dashboard.fetch_transactions(&wallet).await;
    assert_eq!(transactions.data.map(|txs| txs.len()), Some(0));
    assert!(!transactions.is_loading);

    assert!(dashboard.watch_balance(&wallet).is_none());
    assert!(dashboard.watch_transactions(&wallet).is_none());
    sleep(Duration::from_millis(10)).await;
    assert_eq!(fake.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_address_disables_queries() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);
    let wallet = WalletState::connected("0x1234", 1);

    let balance = dashboard.fetch_balance(&wallet).await;
    assert!(balance.data.is_none());
    assert!(!balance.is_error);
    assert_eq!(fake.calls_to("account.balance"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_price_failure_drops_usd_but_keeps_balance() {
    let fake = FakeExplorer::new(|req, _| {
        if req.action == "ethprice" {
            Ok(ExplorerEnvelope::failed("NOTOK", json!("Max rate limit reached")))
        } else {
            Ok(default_response(req))
        }
    });
    let dashboard = dashboard(&fake);

    let result = dashboard.fetch_balance(&wallet()).await;

    let balance = result.data.unwrap();
    assert_eq!(balance.formatted, "1.5");
    assert_eq!(balance.usd, None);
    assert!(result.is_error);
    assert_eq!(result.error.map(|e| e.kind()), Some(ErrorKind::Config));

    let price = dashboard.fetch_eth_price().await;
    assert!(price.is_error);
    assert!(price.data.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_missing_api_key_uses_native_fallback() {
    let fake = FakeExplorer::healthy();
    let explorer = Arc::new(fake.client_with(ExplorerConfigBuilder::new().build()));
    let fallback = Arc::new(StaticBalance {
        wei: 2_000_000_000_000_000_000,
        calls: AtomicUsize::new(0),
    });
    let dashboard = WalletDashboard::new(explorer).with_balance_fallback(fallback.clone());

    let balance = dashboard.fetch_balance(&wallet()).await;
    assert_eq!(balance.data.unwrap().formatted, "2");
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);

    let transactions = dashboard.fetch_transactions(&wallet()).await;
    assert!(transactions.is_error);
    assert_eq!(transactions.error.map(|e| e.kind()), Some(ErrorKind::Config));
    assert_eq!(fake.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_api_key_without_fallback_is_config_error() {
    let fake = FakeExplorer::healthy();
    let explorer = Arc::new(fake.client_with(ExplorerConfigBuilder::new().build()));
    let dashboard = WalletDashboard::new(explorer);

    let balance = dashboard.fetch_balance(&wallet()).await;

    assert!(balance.data.is_none());
    let error = balance.error.unwrap();
    assert_eq!(error.kind(), ErrorKind::Config);
    assert!(error.user_message().contains("ETHERSCAN_API_KEY"));
}

#[tokio::test(start_paused = true)]
async fn test_transactions_filtered_and_bounded() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let result = dashboard.fetch_transactions(&wallet()).await;

    let transactions = result.data.unwrap();
    assert_eq!(transactions.len(), 5);
    assert!(transactions.iter().all(|tx| !tx.is_error));
    assert!(transactions
        .windows(2)
        .all(|pair| pair[0].timestamp_ms > pair[1].timestamp_ms));
}

#[tokio::test(start_paused = true)]
async fn test_transaction_limit_is_configurable() {
    let fake = FakeExplorer::healthy();
    let options = DashboardOptions {
        transaction_limit: 2,
        ..DashboardOptions::default()
    };
    let dashboard = WalletDashboard::with_options(Arc::new(fake.client()), options);

    let transactions = dashboard.fetch_transactions(&wallet()).await.data.unwrap();
    assert_eq!(transactions.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_loads_then_settles() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let first = dashboard.transactions(&wallet());
    assert!(first.is_loading);
    assert!(first.data.is_none());

    sleep(Duration::from_millis(10)).await;

    let second = dashboard.transactions(&wallet());
    assert!(!second.is_loading);
    assert_eq!(second.data.map(|txs| txs.len()), Some(5));
    assert_eq!(fake.calls_to("account.txlist"), 1, "fresh for 30s");
}

#[tokio::test(start_paused = true)]
async fn test_price_is_cached_for_a_minute() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let price = dashboard.fetch_eth_price().await.data.unwrap();
    assert_eq!(price.price, 2000.0);

    sleep(Duration::from_secs(59)).await;
    dashboard.fetch_eth_price().await;
    assert_eq!(fake.calls_to("stats.ethprice"), 1);

    sleep(Duration::from_secs(1)).await;
    dashboard.fetch_eth_price().await;
    assert_eq!(fake.calls_to("stats.ethprice"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_balance_keyed_by_chain() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    dashboard.fetch_balance(&wallet()).await;
    dashboard
        .fetch_balance(&WalletState::connected(WALLET_STR, 11_155_111))
        .await;

    let hosts: Vec<_> = fake
        .requests()
        .iter()
        .filter(|req| req.action == "balance")
        .map(|req| req.url.host_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(hosts, ["api.etherscan.io", "api-sepolia.etherscan.io"]);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_chain_is_typed_error() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let result = dashboard
        .fetch_transactions(&WalletState::connected(WALLET_STR, 137))
        .await;

    assert!(matches!(
        result.error,
        Some(AppError::UnsupportedNetwork { chain_id: 137 })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_watch_transactions_polls_every_thirty_seconds() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let subscription = dashboard.watch_transactions(&wallet()).unwrap();
    sleep(Duration::from_millis(1)).await;
    assert_eq!(fake.calls_to("account.txlist"), 1);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(fake.calls_to("account.txlist"), 2);

    drop(subscription);
    sleep(Duration::from_secs(90)).await;
    assert_eq!(fake.calls_to("account.txlist"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_watch_balance_polls_every_ten_seconds() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    let mut subscription = dashboard.watch_balance(&wallet()).unwrap();
    let mut value = None;
    while value.is_none() {
        value = subscription.changed().await.and_then(|state| state.value);
    }
    assert_eq!(value.unwrap().formatted(), "1.5");

    sleep(Duration::from_millis(20_001)).await;
    assert_eq!(fake.calls_to("account.balance"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_collect_garbage_after_gc_time() {
    let fake = FakeExplorer::healthy();
    let dashboard = dashboard(&fake);

    dashboard.fetch_balance(&wallet()).await;
    dashboard.fetch_transactions(&wallet()).await;

    // balance and transactions expire after 5 minutes, the price after an hour
    sleep(Duration::from_secs(5 * 60)).await;
    assert_eq!(dashboard.collect_garbage(), 2);

    sleep(Duration::from_secs(55 * 60)).await;
    assert_eq!(dashboard.collect_garbage(), 1);
}
