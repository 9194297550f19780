// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for native currency amounts
//!
//! This module provides a newtype wrapper for native currency (ETH) in wei so
//! balances, transfer values and gas prices are never confused with plain
//! integers or display strings.

use std::str::FromStr;

use alloy_primitives::U256;
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Wei per ether (10^18)
const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const ETHER_DECIMALS: usize = 18;

/// Represents an amount of native currency in wei
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use walletscope::WeiAmount;
///
/// let balance = WeiAmount::new(U256::from(1_500_000_000_000_000_000u128));
/// assert_eq!(balance.formatted(), "1.5");
/// assert!((balance.to_ether() - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct WeiAmount(U256);

impl WeiAmount {
    /// Zero wei amount
    pub const ZERO: Self = Self(U256::ZERO);

    /// Create a new wei amount
    pub const fn new(wei: U256) -> Self {
        Self(wei)
    }

    /// Parse a decimal wei string as returned by the explorer.
    ///
    /// Only ASCII digits are accepted; signs, whitespace, hex and fractions
    /// are validation errors.
    ///
    /// ```
    /// use walletscope::WeiAmount;
    ///
    /// assert_eq!(WeiAmount::parse("1000").unwrap(), WeiAmount::from(1000u64));
    /// assert!(WeiAmount::parse("0x10").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, AppError> {
        parse_decimal_u256(value)
            .map(Self)
            .ok_or_else(|| AppError::validation(format!("Invalid wei amount: {value:?}")))
    }

    /// Get the inner U256 value (in wei)
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Exact ether value as a decimal string, without trailing zeros.
    ///
    /// `0` wei formats as `"0"`, one wei as `"0.000000000000000001"`.
    pub fn formatted(&self) -> String {
        let divisor = U256::from(WEI_PER_ETHER);
        let whole = self.0 / divisor;
        let fractional = self.0 % divisor;

        if fractional.is_zero() {
            return whole.to_string();
        }

        let digits = format!("{:0>width$}", fractional.to_string(), width = ETHER_DECIMALS);
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    /// Exact ether value.
    pub fn to_ether_decimal(&self) -> BigDecimal {
        // `formatted` only ever yields plain decimal digits
        BigDecimal::from_str(&self.formatted()).unwrap_or_default()
    }

    /// Convert to ether (1 ETH = 10^18 wei)
    ///
    /// Returns f64 for display purposes. This is a lossy conversion.
    pub fn to_ether(&self) -> f64 {
        self.to_ether_decimal().to_f64().unwrap_or(0.0)
    }
}

/// Parse a non-empty string of ASCII decimal digits.
pub(crate) fn parse_decimal_u256(value: &str) -> Option<U256> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(value, 10).ok()
}

impl From<u64> for WeiAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for WeiAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for WeiAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ETH", self.formatted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_amount_creation() {
        let amount = WeiAmount::new(U256::from(1000));
        assert_eq!(amount.as_u256(), U256::from(1000));
    }

    #[test]
    fn test_wei_amount_zero() {
        assert_eq!(WeiAmount::ZERO.as_u256(), U256::ZERO);
        assert_eq!(WeiAmount::ZERO.formatted(), "0");
        assert_eq!(WeiAmount::ZERO.to_ether(), 0.0);
    }

    #[test]
    fn test_formatted() {
        assert_eq!(WeiAmount::from(1u64).formatted(), "0.000000000000000001");
        assert_eq!(
            WeiAmount::new(U256::from(10_000_000_000_000_000_000u128)).formatted(),
            "10"
        );
        assert_eq!(
            WeiAmount::new(U256::from(1_234_500_000_000_000_000u128)).formatted(),
            "1.2345"
        );
    }

    #[test]
    fn test_to_ether() {
        let amount = WeiAmount::new(U256::from(1_500_000_000_000_000_000u128)); // 1.5 ETH
        let eth = amount.to_ether();
        assert!((eth - 1.5).abs() < 0.0001);
    }

    #[test]
    fn test_to_ether_decimal_is_exact() {
        let amount = WeiAmount::new(U256::from(123_456_789_000_000_000_001u128));
        assert_eq!(
            amount.to_ether_decimal(),
            BigDecimal::from_str("123.456789000000000001").unwrap()
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(WeiAmount::parse("0").unwrap(), WeiAmount::ZERO);
        assert_eq!(
            WeiAmount::parse("115792089237316195423570985008687907853269984665640564039457584007913129639935")
                .unwrap()
                .as_u256(),
            U256::MAX
        );

        for bad in ["", "-1", "1.5", " 1", "0x1f", "1e18"] {
            let err = WeiAmount::parse(bad).unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_parse_overflow() {
        // U256::MAX + 1
        assert!(WeiAmount::parse(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
        )
        .is_err());
    }

    #[test]
    fn test_display() {
        let amount = WeiAmount::new(U256::from(10_000_000_000_000_000u64));
        assert_eq!(format!("{amount}"), "0.01 ETH");
    }

    #[test]
    fn test_serialization() {
        let amount = WeiAmount::new(U256::from(1000));
        let json = serde_json::to_string(&amount).unwrap();
        let deserialized: WeiAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, deserialized);
    }
}
