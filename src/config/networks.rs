// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Supported explorer networks
//!
//! The registry is closed: Ethereum Mainnet and Sepolia. Any other chain id is
//! rejected with [`AppError::UnsupportedNetwork`] before any I/O happens.

use alloy_chains::NamedChain;
use alloy_primitives::{Address, B256};

use crate::errors::AppError;

/// Explorer endpoints for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Chain this entry describes
    pub chain: NamedChain,
    /// Explorer API base URL (without `/api`)
    pub api_url: &'static str,
    /// Human-facing explorer base URL
    pub explorer_url: &'static str,
    /// Display name
    pub name: &'static str,
}

impl NetworkConfig {
    /// Numeric chain id.
    pub fn chain_id(&self) -> u64 {
        self.chain as u64
    }

    /// Explorer page for a transaction.
    pub fn tx_url(&self, hash: &B256) -> String {
        format!("{}/tx/{hash}", self.explorer_url)
    }

    /// Explorer page for an address.
    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{address}", self.explorer_url)
    }
}

const MAINNET: NetworkConfig = NetworkConfig {
    chain: NamedChain::Mainnet,
    api_url: "https://api.etherscan.io",
    explorer_url: "https://etherscan.io",
    name: "Ethereum Mainnet",
};

const SEPOLIA: NetworkConfig = NetworkConfig {
    chain: NamedChain::Sepolia,
    api_url: "https://api-sepolia.etherscan.io",
    explorer_url: "https://sepolia.etherscan.io",
    name: "Sepolia Testnet",
};

/// The closed set of supported networks.
///
/// # Example
///
/// ```rust
/// use walletscope::Networks;
///
/// assert_eq!(Networks::get(1).unwrap().name, "Ethereum Mainnet");
/// assert!(Networks::get(137).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Networks;

impl Networks {
    /// Every supported network.
    pub const ALL: [NetworkConfig; 2] = [MAINNET, SEPOLIA];

    /// Mainnet entry; ETH price queries always go here.
    pub const fn mainnet() -> &'static NetworkConfig {
        &MAINNET
    }

    /// Look up a network by chain id.
    pub fn get(chain_id: u64) -> Result<&'static NetworkConfig, AppError> {
        Self::find(chain_id).ok_or_else(|| AppError::unsupported_network(chain_id))
    }

    /// Look up a network by chain id without building an error.
    pub fn find(chain_id: u64) -> Option<&'static NetworkConfig> {
        match NamedChain::try_from(chain_id) {
            Ok(NamedChain::Mainnet) => Some(&MAINNET),
            Ok(NamedChain::Sepolia) => Some(&SEPOLIA),
            _ => None,
        }
    }

    /// Whether `chain_id` is supported.
    pub fn is_supported(chain_id: u64) -> bool {
        Self::find(chain_id).is_some()
    }

    /// Explorer transaction page, or an empty string on an unsupported chain.
    pub fn tx_url(chain_id: u64, hash: &B256) -> String {
        Self::find(chain_id)
            .map(|network| network.tx_url(hash))
            .unwrap_or_default()
    }

    /// Explorer address page, or an empty string on an unsupported chain.
    pub fn address_url(chain_id: u64, address: &Address) -> String {
        Self::find(chain_id)
            .map(|network| network.address_url(address))
            .unwrap_or_default()
    }
}

/// Shorten a hex string to `0x1234...abcd`.
///
/// Strings too short to shorten are returned unchanged.
pub fn format_short(value: &str) -> String {
    if value.len() <= 10 || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}
