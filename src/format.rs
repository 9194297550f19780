// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Display formatting for ETH and USD amounts.

/// ETH value with exactly four decimals.
///
/// ```
/// use walletscope::format_eth_value;
///
/// assert_eq!(format_eth_value(1.23456), "1.2346");
/// assert_eq!(format_eth_value(0.0), "0.0000");
/// ```
pub fn format_eth_value(eth: f64) -> String {
    format!("{eth:.4}")
}

/// USD equivalent of `eth` at `price` USD/ETH.
///
/// Zero renders as `$0.00`, positive values under a cent as
/// `less than $0.01`, everything else with two decimals and thousands
/// separators.
///
/// ```
/// use walletscope::format_usd_value;
///
/// assert_eq!(format_usd_value(0.5, 2469.12), "$1,234.56");
/// assert_eq!(format_usd_value(0.000001, 2000.0), "less than $0.01");
/// ```
pub fn format_usd_value(eth: f64, price: f64) -> String {
    let value = eth * price;

    if value == 0.0 {
        return "$0.00".to_string();
    }

    if value > 0.0 && value < 0.01 {
        return "less than $0.01".to_string();
    }

    format!("${}", group_thousands(&format!("{value:.2}")))
}

/// Insert `,` every three digits of the integer part.
fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}
