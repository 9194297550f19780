// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Native balance reads straight from a chain node.
//!
//! Used by the dashboard when the explorer cannot serve balances because it is
//! misconfigured (no API key, key rejected).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, Instrument};

use crate::config::constants::defaults;
use crate::errors::{classify, AppError};
use crate::spans;
use crate::types::wei::WeiAmount;

/// Source of native balances independent of the explorer.
#[async_trait]
pub trait NativeBalanceSource: Send + Sync {
    /// Balance of `address` on `chain_id`.
    async fn native_balance(&self, chain_id: u64, address: Address) -> Result<WeiAmount, AppError>;
}

/// [`NativeBalanceSource`] over JSON-RPC `eth_getBalance`, one endpoint per chain.
///
/// # Example
///
/// ```rust
/// use walletscope::RpcBalanceSource;
///
/// let source = RpcBalanceSource::new()
///     .with_endpoint(1, "https://eth.llamarpc.com")?
///     .with_endpoint(11_155_111, "https://rpc.sepolia.org")?;
/// assert!(source.supports(1));
/// # Ok::<(), walletscope::AppError>(())
/// ```
#[derive(Clone)]
pub struct RpcBalanceSource {
    providers: HashMap<u64, Arc<dyn Provider + Send + Sync>>,
    request_timeout: Duration,
}

impl Default for RpcBalanceSource {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            request_timeout: defaults::REQUEST_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for RpcBalanceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chains: Vec<_> = self.providers.keys().copied().collect();
        chains.sort_unstable();
        f.debug_struct("RpcBalanceSource")
            .field("chains", &chains)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl RpcBalanceSource {
    /// Source with no endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the RPC endpoint for `chain_id`.
    ///
    /// # Errors
    ///
    /// [`AppError::Config`] if `rpc_url` is not a valid URL.
    pub fn with_endpoint(mut self, chain_id: u64, rpc_url: &str) -> Result<Self, AppError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| AppError::config(format!("Invalid RPC URL '{rpc_url}': {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url);
        self.providers
            .insert(chain_id, Arc::new(provider) as Arc<dyn Provider + Send + Sync>);
        Ok(self)
    }

    /// Register an already-built provider for `chain_id`.
    pub fn with_provider(mut self, chain_id: u64, provider: Arc<dyn Provider + Send + Sync>) -> Self {
        self.providers.insert(chain_id, provider);
        self
    }

    /// Bound each RPC call.
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Whether an endpoint is registered for `chain_id`.
    pub fn supports(&self, chain_id: u64) -> bool {
        self.providers.contains_key(&chain_id)
    }
}

#[async_trait]
impl NativeBalanceSource for RpcBalanceSource {
    async fn native_balance(&self, chain_id: u64, address: Address) -> Result<WeiAmount, AppError> {
        let provider = self
            .providers
            .get(&chain_id)
            .ok_or_else(|| AppError::unsupported_network(chain_id))?;

        async move {
            match timeout(self.request_timeout, provider.get_balance(address)).await {
                Ok(Ok(wei)) => {
                    debug!(wei = %wei, "Fetched native balance over RPC");
                    Ok(WeiAmount::new(wei))
                }
                Ok(Err(e)) => Err(classify(e)),
                Err(_) => Err(AppError::network(format!(
                    "RPC balance request timed out after {}ms",
                    self.request_timeout.as_millis()
                ))),
            }
        }
        .instrument(spans::native_balance_fallback(chain_id, address))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = RpcBalanceSource::new()
            .with_endpoint(1, "not a url")
            .unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[tokio::test]
    async fn test_unregistered_chain_is_unsupported() {
        let source = RpcBalanceSource::new()
            .with_endpoint(1, "http://127.0.0.1:8545")
            .unwrap();
        assert!(source.supports(1));

        let err = source
            .native_balance(10, Address::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedNetwork { chain_id: 10 }));
    }
}
