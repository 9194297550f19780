// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Raw explorer records to [`ProcessedTransaction`]s.
//!
//! Every record of a batch is validated before anything is surfaced: one
//! malformed record fails the whole batch with [`AppError::Validation`] naming
//! the record index and field. Valid batches are mapped, stripped of failed
//! (`isError == "1"`) transactions, and truncated to the requested limit in
//! input order.

use std::str::FromStr;

use alloy_primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::explorer::types::RawTransaction;
use crate::types::wei::{parse_decimal_u256, WeiAmount};

/// A validated transaction ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    /// Transaction hash
    pub hash: TxHash,
    /// Sender
    pub from: Address,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    /// Transferred value
    pub value: WeiAmount,
    /// Block time in milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Confirmations at query time
    pub confirmations: u64,
    /// Always `false` for surfaced transactions
    pub is_error: bool,
    /// Gas consumed
    pub gas_used: U256,
    /// Price paid per unit of gas
    pub gas_price: WeiAmount,
    /// 4-byte selector, when the explorer decoded one
    pub method_id: Option<String>,
    /// Decoded function signature, when available
    pub function_name: Option<String>,
}

impl ProcessedTransaction {
    /// Block time as a UTC datetime.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.timestamp_ms).ok()?)
    }

    /// Fee paid: `gas_used * gas_price`, saturating.
    pub fn fee(&self) -> WeiAmount {
        WeiAmount::new(self.gas_used.saturating_mul(self.gas_price.as_u256()))
    }
}

/// Validate, map, filter and bound a batch of raw records.
///
/// # Errors
///
/// [`AppError::Validation`] if any record is malformed, even one that would
/// have been filtered out.
///
/// # Example
///
/// ```rust
/// use walletscope::explorer::transform::transform;
///
/// let processed = transform(&[], 5)?;
/// assert!(processed.is_empty());
/// # Ok::<(), walletscope::AppError>(())
/// ```
pub fn transform(
    raw: &[RawTransaction],
    limit: usize,
) -> Result<Vec<ProcessedTransaction>, AppError> {
    let processed = raw
        .iter()
        .enumerate()
        .map(|(index, record)| process(index, record))
        .collect::<Result<Vec<_>, _>>()?;

    let total = processed.len();
    let surfaced: Vec<_> = processed
        .into_iter()
        .filter(|tx| !tx.is_error)
        .take(limit)
        .collect();

    debug!(
        received = total,
        surfaced = surfaced.len(),
        limit = limit,
        "Transformed transactions"
    );

    Ok(surfaced)
}

fn process(index: usize, raw: &RawTransaction) -> Result<ProcessedTransaction, AppError> {
    let invalid = |field: &str, value: &str| {
        AppError::validation(format!(
            "Transaction {index}: invalid {field} {value:?}"
        ))
    };

    let hash = parse_prefixed_hex::<TxHash>(&raw.hash).ok_or_else(|| invalid("hash", &raw.hash))?;
    let from =
        parse_prefixed_hex::<Address>(&raw.from).ok_or_else(|| invalid("from", &raw.from))?;
    let to = if raw.to.is_empty() {
        None
    } else {
        Some(parse_prefixed_hex::<Address>(&raw.to).ok_or_else(|| invalid("to", &raw.to))?)
    };

    let value = parse_decimal_u256(&raw.value).ok_or_else(|| invalid("value", &raw.value))?;
    let gas_used =
        parse_decimal_u256(&raw.gas_used).ok_or_else(|| invalid("gasUsed", &raw.gas_used))?;
    let gas_price =
        parse_decimal_u256(&raw.gas_price).ok_or_else(|| invalid("gasPrice", &raw.gas_price))?;

    let timestamp_ms = parse_decimal_u64(&raw.time_stamp)
        .and_then(|secs| secs.checked_mul(1_000))
        .ok_or_else(|| invalid("timeStamp", &raw.time_stamp))?;
    let confirmations = parse_decimal_u64(&raw.confirmations)
        .ok_or_else(|| invalid("confirmations", &raw.confirmations))?;

    let is_error = match raw.is_error.as_str() {
        "0" => false,
        "1" => true,
        other => return Err(invalid("isError", other)),
    };

    Ok(ProcessedTransaction {
        hash,
        from,
        to,
        value: WeiAmount::new(value),
        timestamp_ms,
        confirmations,
        is_error,
        gas_used,
        gas_price: WeiAmount::new(gas_price),
        method_id: non_empty(raw.method_id.as_deref()),
        function_name: non_empty(raw.function_name.as_deref()),
    })
}

/// Fixed-width hex with a mandatory `0x` prefix.
fn parse_prefixed_hex<T: FromStr>(value: &str) -> Option<T> {
    value.strip_prefix("0x")?;
    T::from_str(value).ok()
}

fn parse_decimal_u64(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
