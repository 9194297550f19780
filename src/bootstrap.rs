// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line entry point: print a wallet snapshot, optionally keep polling.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use tracing::{debug, info, warn};

use crate::{
    format_eth_value, format_short, BlockExplorerClient, DashboardOptions, EthPrice,
    ExplorerConfig, Networks, ProcessedTransaction, QueryResult, RpcBalanceSource,
    WalletDashboard, WalletState, WeiAmount,
};

/// Wallet snapshot from an Etherscan-style explorer.
#[derive(Parser, Debug)]
#[command(name = "walletscope", author, version, about, long_about = None)]
pub struct Cli {
    /// Wallet address (0x-prefixed)
    pub address: String,

    /// Chain id of the wallet's network
    #[arg(long, default_value_t = 1)]
    pub chain_id: u64,

    /// Keep polling and print every update, sweeping idle queries every SECONDS
    #[arg(long, value_name = "SECONDS")]
    pub watch: Option<u64>,

    /// JSON-RPC endpoint used for balances when the explorer is unusable
    #[arg(long, env = "WALLETSCOPE_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Number of transactions to show
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

impl Cli {
    /// Load `.env`, then parse the process arguments.
    ///
    /// Exits with clap's usage message on invalid arguments.
    pub fn load() -> Self {
        Self::load_from(None, std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Load `env_file` (or `.env` from the working directory) into the
    /// environment before parsing `args`, so env-backed flags see its values.
    pub fn load_from<I, T>(env_file: Option<&Path>, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let loaded = match env_file {
            Some(path) => dotenvy::from_path(path),
            None => dotenv().map(|_| ()),
        };
        if let Err(e) = loaded {
            debug!("No env file loaded: {e}");
        }
        Self::try_parse_from(args)
    }
}

/// Main entry point for the application.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let network = Networks::get(cli.chain_id)?;
    let wallet = WalletState::connected(cli.address.clone(), cli.chain_id);
    if wallet.account().is_none() {
        anyhow::bail!("Invalid wallet address: {}", cli.address);
    }

    let config = ExplorerConfig::from_env();
    if !config.has_api_key() {
        warn!("ETHERSCAN_API_KEY is not set; explorer requests will fail");
    }

    let explorer = Arc::new(BlockExplorerClient::new(config)?);
    let options = DashboardOptions {
        transaction_limit: cli.limit,
        ..DashboardOptions::default()
    };
    let mut dashboard = WalletDashboard::with_options(explorer, options);

    if let Some(rpc_url) = cli.rpc_url.as_deref() {
        let source = RpcBalanceSource::new().with_endpoint(cli.chain_id, rpc_url)?;
        dashboard = dashboard.with_balance_fallback(Arc::new(source));
        info!(chain = network.name, "Native balance fallback enabled");
    }

    info!(
        network = network.name,
        address = %format_short(&cli.address),
        "Fetching wallet snapshot"
    );

    let (balance, price, transactions) = futures::join!(
        dashboard.fetch_balance(&wallet),
        dashboard.fetch_eth_price(),
        dashboard.fetch_transactions(&wallet),
    );

    println!("{} on {}", format_short(&cli.address), network.name);
    print_balance(
        balance.data.map(|b| b.value),
        balance.error.as_ref().map(|e| e.user_message()),
        &price,
    );
    print_transactions(
        cli.chain_id,
        &transactions.data.unwrap_or_default(),
        transactions.error.as_ref().map(|e| e.user_message()),
    );

    if let Some(seconds) = cli.watch {
        watch(&dashboard, &wallet, Duration::from_secs(seconds.max(1))).await?;
    }

    Ok(())
}

async fn watch(
    dashboard: &WalletDashboard,
    wallet: &WalletState,
    sweep_every: Duration,
) -> anyhow::Result<()> {
    let (Some(mut balances), Some(mut transactions)) = (
        dashboard.watch_balance(wallet),
        dashboard.watch_transactions(wallet),
    ) else {
        anyhow::bail!("Wallet is not connected");
    };
    let mut prices = dashboard.watch_eth_price();
    let mut sweep = tokio::time::interval(sweep_every);

    info!("Watching for updates, press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                return Ok(());
            }
            Some(state) = balances.changed() => {
                if state.is_fetching {
                    continue;
                }
                let price = QueryResult::from(prices.current());
                print_balance(state.value, state.error.map(|e| e.user_message()), &price);
            }
            Some(state) = prices.changed() => {
                if let Some(price) = state.value.filter(|_| !state.is_fetching) {
                    println!("ETH/USD: ${:.2}", price.price);
                }
            }
            Some(state) = transactions.changed() => {
                if state.is_fetching {
                    continue;
                }
                print_transactions(
                    wallet.chain_id,
                    &state.value.unwrap_or_default(),
                    state.error.map(|e| e.user_message()),
                );
            }
            _ = sweep.tick() => {
                let evicted = dashboard.collect_garbage();
                debug!(evicted, "Swept idle queries");
            }
        }
    }
}

fn print_balance(value: Option<WeiAmount>, error: Option<String>, price: &QueryResult<EthPrice>) {
    match (value, error) {
        (Some(value), _) => {
            let usd = price
                .data
                .as_ref()
                .filter(|_| !price.is_error)
                .map(|price| crate::format_usd_value(value.to_ether(), price.price))
                .unwrap_or_else(|| "price unavailable".to_string());
            println!(
                "Balance: {} ETH ({usd})",
                format_eth_value(value.to_ether())
            );
        }
        (None, Some(error)) => println!("Balance: {error}"),
        (None, None) => println!("Balance: -"),
    }
}

fn print_transactions(chain_id: u64, transactions: &[ProcessedTransaction], error: Option<String>) {
    if let Some(error) = error {
        println!("Transactions: {error}");
    }
    if transactions.is_empty() {
        println!("No recent transactions");
        return;
    }

    println!("Recent transactions:");
    for tx in transactions {
        let to = tx
            .to
            .map(|to| format_short(&to.to_string()))
            .unwrap_or_else(|| "contract creation".to_string());
        let when = tx
            .timestamp()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {when}  {} -> {to}  {} ETH  {}",
            format_short(&tx.from.to_string()),
            format_eth_value(tx.value.to_ether()),
            Networks::tx_url(chain_id, &tx.hash),
        );
    }
}
