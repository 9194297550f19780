// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for error classification
//!
//! `classify` must be total and deterministic, and the retry decision must
//! follow the metadata table for every kind.

use proptest::prelude::*;
use std::time::Duration;
use walletscope::{classify, AppError, ErrorKind, Failure};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct OpaqueError(String);

fn arb_app_error() -> impl Strategy<Value = AppError> {
    prop_oneof![
        ".*".prop_map(AppError::validation),
        ".*".prop_map(AppError::network),
        ".*".prop_map(AppError::wallet),
        (any::<Option<i64>>(), ".*").prop_map(|(code, msg)| AppError::rpc(code, msg)),
        any::<u64>().prop_map(AppError::unsupported_network),
        (0u64..=60_000).prop_map(|ms| AppError::rate_limit(Duration::from_millis(ms))),
        ".*".prop_map(AppError::config),
        (100u16..=599).prop_map(AppError::http),
        ".*".prop_map(AppError::unknown),
    ]
}

proptest! {
    /// Property: already-classified errors pass through with the same kind
    #[test]
    fn prop_app_errors_are_fixed_points(error in arb_app_error()) {
        let kind = error.kind();
        let message = error.to_string();

        let classified = classify(error);

        prop_assert_eq!(classified.kind(), kind);
        prop_assert_eq!(classified.to_string(), message);
    }

    /// Property: boxing an AppError does not change its classification
    #[test]
    fn prop_boxed_app_errors_pass_through(error in arb_app_error()) {
        let kind = error.kind();
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(error);

        prop_assert_eq!(classify(boxed).kind(), kind);
    }

    /// Property: is_retryable follows the metadata table, with the HTTP status
    /// deciding for Http
    #[test]
    fn prop_retryable_matches_table(error in arb_app_error()) {
        let expected = match &error {
            AppError::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            other => other.kind().metadata().retryable,
        };

        prop_assert_eq!(error.is_retryable(), expected);
        prop_assert_eq!(error.metadata().recoverable, error.kind().metadata().recoverable);
        prop_assert_eq!(
            error.requires_user_action(),
            error.kind().metadata().user_action_required
        );
    }

    /// Property: plain strings always classify as Unknown carrying the string
    #[test]
    fn prop_strings_are_unknown(message in ".*") {
        let classified = classify(message.as_str());

        prop_assert_eq!(classified.kind(), ErrorKind::Unknown);
        prop_assert_eq!(classified.to_string(), message);
    }

    /// Property: RPC payloads always classify as EthereumRpc keeping the code
    #[test]
    fn prop_rpc_payloads_keep_code(code in any::<i64>(), message in proptest::option::of(".*")) {
        let classified = classify(Failure::Rpc { code, message });

        prop_assert_eq!(classified.kind(), ErrorKind::EthereumRpc);
        prop_assert_eq!(classified.code(), Some(code));
        prop_assert!(classified.is_retryable());
    }

    /// Property: opaque errors are classified by message, network first,
    /// and classification is deterministic
    #[test]
    fn prop_opaque_errors_by_message(message in "[a-zA-Z ]{0,40}") {
        let expected = {
            let lowered = message.to_lowercase();
            if lowered.contains("network") {
                ErrorKind::Network
            } else if lowered.contains("wallet") || lowered.contains("metamask") {
                ErrorKind::Wallet
            } else {
                ErrorKind::Unknown
            }
        };

        let first = classify(Failure::from_error(OpaqueError(message.clone())));
        let second = classify(Failure::from_error(OpaqueError(message)));

        prop_assert_eq!(first.kind(), expected);
        prop_assert_eq!(second.kind(), expected);
    }
}

#[test]
fn test_absent_failure_is_unknown() {
    let classified = classify(None::<String>);
    assert_eq!(classified.kind(), ErrorKind::Unknown);
    assert_eq!(classified.to_string(), "An unknown error occurred");
}

#[test]
fn test_every_kind_has_metadata() {
    for kind in ErrorKind::ALL {
        let metadata = kind.metadata();
        if metadata.retryable {
            assert!(metadata.recoverable, "{kind} is retryable but not recoverable");
        }
    }
    assert!(!ErrorKind::Validation.metadata().recoverable);
    assert!(!ErrorKind::Unknown.metadata().recoverable);
}
