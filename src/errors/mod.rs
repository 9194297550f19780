// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the walletscope library.
//!
//! Every failure that crosses a public API is an [`AppError`]. The enum is
//! closed: each variant is one error *kind*, and the recoverability / retry
//! metadata attached to it is looked up from the kind (see [`ErrorKind::metadata`]).
//! Callers branch on the kind or the metadata, never on message text.
//!
//! Raw failures (transport errors, JSON decoding errors, JSON-RPC error payloads,
//! strings) are turned into an [`AppError`] exactly once, at the boundary, by
//! [`classify`].
//!
//! # Examples
//!
//! ```rust
//! use walletscope::{AppError, ErrorKind};
//!
//! let error = AppError::unsupported_network(137);
//! assert_eq!(error.kind(), ErrorKind::UnsupportedNetwork);
//! assert!(error.requires_user_action());
//! assert!(!error.is_retryable());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

mod classify;

pub use classify::{classify, Failure};

/// Shared, cloneable cause attached to an [`AppError`].
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The closed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Upstream data violated the expected schema.
    Validation,
    /// Transient networking failure.
    Network,
    /// Wallet or wallet-provider failure.
    Wallet,
    /// JSON-RPC error response from a node.
    EthereumRpc,
    /// Chain id outside the configured network registry.
    UnsupportedNetwork,
    /// Request rejected by the local rate limiter.
    RateLimit,
    /// Deployment configuration is missing or rejected upstream.
    Config,
    /// Non-2xx HTTP response.
    Http,
    /// Input that could not be attributed to any other kind.
    Unknown,
}

/// Recoverability and retry metadata for an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorMetadata {
    /// Can the application keep working after this error?
    pub recoverable: bool,
    /// Does the user have to do something (switch network, fix config)?
    pub user_action_required: bool,
    /// May the failed operation be retried automatically?
    pub retryable: bool,
}

impl ErrorMetadata {
    const fn new(recoverable: bool, user_action_required: bool, retryable: bool) -> Self {
        Self {
            recoverable,
            user_action_required,
            retryable,
        }
    }
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Validation,
        ErrorKind::Network,
        ErrorKind::Wallet,
        ErrorKind::EthereumRpc,
        ErrorKind::UnsupportedNetwork,
        ErrorKind::RateLimit,
        ErrorKind::Config,
        ErrorKind::Http,
        ErrorKind::Unknown,
    ];

    /// Metadata lookup table.
    ///
    /// For [`ErrorKind::Http`] this returns the retryable form; the status-aware
    /// value is [`AppError::metadata`].
    pub const fn metadata(self) -> ErrorMetadata {
        match self {
            ErrorKind::Validation => ErrorMetadata::new(false, true, false),
            ErrorKind::Network => ErrorMetadata::new(true, false, true),
            ErrorKind::Wallet => ErrorMetadata::new(true, true, false),
            ErrorKind::EthereumRpc => ErrorMetadata::new(true, false, true),
            ErrorKind::UnsupportedNetwork => ErrorMetadata::new(true, true, false),
            ErrorKind::RateLimit => ErrorMetadata::new(true, false, false),
            ErrorKind::Config => ErrorMetadata::new(true, true, false),
            ErrorKind::Http => ErrorMetadata::new(true, false, true),
            ErrorKind::Unknown => ErrorMetadata::new(false, false, false),
        }
    }

    /// Stable machine-readable name (`VALIDATION_ERROR`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Wallet => "WALLET_ERROR",
            ErrorKind::EthereumRpc => "ETHEREUM_RPC_ERROR",
            ErrorKind::UnsupportedNetwork => "UNSUPPORTED_NETWORK",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::Config => "CONFIG_ERROR",
            ErrorKind::Http => "HTTP_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for all walletscope operations.
///
/// Cloneable so a single failure can be cached and handed to every subscriber
/// of a query.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    /// Upstream data failed schema validation.
    ///
    /// Usually a bug or an API contract change, not a transient condition.
    #[error("Validation failed: {message}")]
    Validation {
        /// What failed to validate
        message: String,
        /// The underlying decoding error, if any
        #[source]
        source: Option<ErrorSource>,
    },

    /// Network connectivity failure (connect, timeout, dropped connection).
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure
        message: String,
        /// The underlying transport error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Wallet or wallet-provider failure.
    #[error("Wallet error: {message}")]
    Wallet {
        /// Description of the failure
        message: String,
        /// The underlying error
        #[source]
        source: Option<ErrorSource>,
    },

    /// JSON-RPC error response.
    #[error("Ethereum RPC error: {message}")]
    EthereumRpc {
        /// Error message from the node
        message: String,
        /// JSON-RPC error code, when the response carried one
        code: Option<i64>,
        /// The underlying error
        #[source]
        source: Option<ErrorSource>,
    },

    /// The chain id is not in the network registry.
    #[error("Network with chain ID {chain_id} is not supported")]
    UnsupportedNetwork {
        /// The rejected chain id
        chain_id: u64,
    },

    /// The local rate limiter rejected the request.
    #[error("Rate limit exceeded, retry in {}ms", .wait.as_millis())]
    RateLimit {
        /// Time until the oldest request in the window expires
        wait: Duration,
    },

    /// Deployment configuration problem (missing API key, key rejected upstream).
    #[error("Configuration error: {message}")]
    Config {
        /// What is misconfigured
        message: String,
    },

    /// Non-2xx HTTP response.
    #[error("HTTP error! status: {status}")]
    Http {
        /// HTTP status code
        status: u16,
        /// The underlying error
        #[source]
        source: Option<ErrorSource>,
    },

    /// Unclassified failure.
    #[error("{message}")]
    Unknown {
        /// Description of the failure
        message: String,
        /// The underlying error
        #[source]
        source: Option<ErrorSource>,
    },
}

impl AppError {
    /// Create a `Validation` error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a `Validation` error wrapping its cause.
    pub fn validation_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Validation {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Create a `Network` error.
    pub fn network(message: impl Into<String>) -> Self {
        AppError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a `Wallet` error.
    pub fn wallet(message: impl Into<String>) -> Self {
        AppError::Wallet {
            message: message.into(),
            source: None,
        }
    }

    /// Create an `EthereumRpc` error.
    pub fn rpc(code: Option<i64>, message: impl Into<String>) -> Self {
        AppError::EthereumRpc {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Create an `UnsupportedNetwork` error.
    pub fn unsupported_network(chain_id: u64) -> Self {
        AppError::UnsupportedNetwork { chain_id }
    }

    /// Create a `RateLimit` error.
    pub fn rate_limit(wait: Duration) -> Self {
        AppError::RateLimit { wait }
    }

    /// Create a `Config` error.
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
        }
    }

    /// Create an `Http` error for a status code.
    pub fn http(status: u16) -> Self {
        AppError::Http {
            status,
            source: None,
        }
    }

    /// Create an `Unknown` error.
    pub fn unknown(message: impl Into<String>) -> Self {
        AppError::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::Network { .. } => ErrorKind::Network,
            AppError::Wallet { .. } => ErrorKind::Wallet,
            AppError::EthereumRpc { .. } => ErrorKind::EthereumRpc,
            AppError::UnsupportedNetwork { .. } => ErrorKind::UnsupportedNetwork,
            AppError::RateLimit { .. } => ErrorKind::RateLimit,
            AppError::Config { .. } => ErrorKind::Config,
            AppError::Http { .. } => ErrorKind::Http,
            AppError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Metadata for this error.
    ///
    /// Identical to `self.kind().metadata()` except for `Http`, which is only
    /// retryable for server errors, request timeouts (408) and upstream
    /// throttling (429).
    pub fn metadata(&self) -> ErrorMetadata {
        let metadata = self.kind().metadata();
        match self {
            AppError::Http { status, .. } => ErrorMetadata {
                retryable: is_retryable_status(*status),
                ..metadata
            },
            _ => metadata,
        }
    }

    /// Whether the application can keep working after this error.
    pub fn is_recoverable(&self) -> bool {
        self.metadata().recoverable
    }

    /// Whether the failed operation may be retried automatically.
    pub fn is_retryable(&self) -> bool {
        self.metadata().retryable
    }

    /// Whether the user has to act before the operation can succeed.
    pub fn requires_user_action(&self) -> bool {
        self.metadata().user_action_required
    }

    /// Numeric sub-code: the JSON-RPC code or the HTTP status.
    pub fn code(&self) -> Option<i64> {
        match self {
            AppError::EthereumRpc { code, .. } => *code,
            AppError::Http { status, .. } => Some(i64::from(*status)),
            _ => None,
        }
    }

    /// Text suitable for showing to an end user.
    ///
    /// Kinds that need user action get a specific instruction; transient kinds
    /// get a generic "temporarily unavailable" notice.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { .. } => {
                "Received unexpected data from the block explorer. Please try again later or report the issue.".to_string()
            }
            AppError::Wallet { message, .. } => {
                format!("Wallet problem: {message}. Please check your wallet and reconnect.")
            }
            AppError::UnsupportedNetwork { chain_id } => format!(
                "Network with ID {chain_id} is not supported. Please switch to Mainnet or Sepolia."
            ),
            AppError::Config { message } => {
                format!("Some features are unavailable: {message}.")
            }
            AppError::RateLimit { wait } => format!(
                "Too many requests. Retrying in {:.1}s.",
                wait.as_secs_f64()
            ),
            AppError::Network { .. } | AppError::EthereumRpc { .. } | AppError::Http { .. } => {
                "Data is temporarily unavailable. Retrying...".to_string()
            }
            AppError::Unknown { .. } => "An unexpected error occurred.".to_string(),
        }
    }
}

/// HTTP statuses worth retrying.
fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Record a failure that is about to be surfaced to the presentation layer.
///
/// Emits one structured `tracing` event with the kind and metadata. User-action
/// kinds are logged at `warn`, everything else at `error`.
pub fn report(error: &AppError, context: &str) {
    let metadata = error.metadata();
    if metadata.user_action_required {
        warn!(
            context = context,
            kind = %error.kind(),
            recoverable = metadata.recoverable,
            retryable = metadata.retryable,
            error = %error,
            "Error requires user action"
        );
    } else {
        error!(
            context = context,
            kind = %error.kind(),
            recoverable = metadata.recoverable,
            retryable = metadata.retryable,
            error = %error,
            "Error report"
        );
    }
}
