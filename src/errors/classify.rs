// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Boundary classification of raw failures into [`AppError`].

use std::error::Error as StdError;
use std::sync::Arc;

use alloy_json_rpc::{ErrorPayload, RpcError};
use alloy_transport::{TransportError, TransportErrorKind};

use super::{AppError, ErrorSource};

const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";
const UNKNOWN_RPC_MESSAGE: &str = "Unknown RPC error";

/// Anything that can be handed to [`classify`].
///
/// The `From` impls cover the failure shapes that reach the crate boundary:
/// already-classified errors, serde decoding errors, reqwest and alloy
/// transport errors, JSON-RPC error payloads, and plain strings.
#[derive(Debug)]
pub enum Failure {
    /// An error that has already been classified.
    App(AppError),
    /// A schema violation found while decoding or validating upstream data.
    Schema {
        /// What violated the schema
        message: String,
        /// The decoding error, if any
        source: Option<ErrorSource>,
    },
    /// A JSON-RPC style error object carrying a numeric code.
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message, if the object had one
        message: Option<String>,
    },
    /// Any other error value.
    Error(Box<dyn StdError + Send + Sync + 'static>),
    /// A bare string.
    Message(String),
    /// Nothing usable at all.
    Unknown,
}

impl Failure {
    /// Wrap an arbitrary error value.
    pub fn from_error(error: impl StdError + Send + Sync + 'static) -> Self {
        Failure::Error(Box::new(error))
    }

    /// A schema violation without an underlying decoding error.
    pub fn schema(message: impl Into<String>) -> Self {
        Failure::Schema {
            message: message.into(),
            source: None,
        }
    }
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Failure::App(error)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Failure::Schema {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }
}

impl From<reqwest::Error> for Failure {
    /// The request URL is dropped: explorer URLs carry the API key.
    fn from(error: reqwest::Error) -> Self {
        Failure::Error(Box::new(error.without_url()))
    }
}

impl From<TransportError> for Failure {
    fn from(error: TransportError) -> Self {
        Failure::Error(Box::new(error))
    }
}

impl From<ErrorPayload> for Failure {
    fn from(payload: ErrorPayload) -> Self {
        Failure::Rpc {
            code: payload.code,
            message: Some(payload.message.to_string()),
        }
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Failure {
    fn from(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Failure::Error(error)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Message(message)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Message(message.to_string())
    }
}

impl<T: Into<Failure>> From<Option<T>> for Failure {
    fn from(value: Option<T>) -> Self {
        value.map_or(Failure::Unknown, Into::into)
    }
}

/// Classify a raw failure into exactly one [`AppError`].
///
/// Total and deterministic; first match wins:
///
/// 1. already an [`AppError`] (also when boxed inside a generic error) → unchanged
/// 2. schema violation (serde decoding, validation) → `Validation`
/// 3. networking failure (HTTP connect/timeout, transport errors, "network" in
///    the message) → `Network`
/// 4. "wallet"/"metamask" in the message → `Wallet`
/// 5. JSON-RPC error object with a numeric code → `EthereumRpc`
/// 6. a plain string → `Unknown` carrying the string
/// 7. anything else → `Unknown`
///
/// Non-2xx HTTP responses surfaced through reqwest or alloy keep their status
/// as `Http`.
///
/// # Examples
///
/// ```rust
/// use walletscope::{classify, ErrorKind, Failure};
///
/// let error = classify(Failure::Rpc { code: -32005, message: None });
/// assert_eq!(error.kind(), ErrorKind::EthereumRpc);
/// assert_eq!(error.code(), Some(-32005));
///
/// assert_eq!(classify("network unreachable").kind(), ErrorKind::Unknown);
/// ```
pub fn classify(raw: impl Into<Failure>) -> AppError {
    match raw.into() {
        Failure::App(error) => error,
        Failure::Schema { message, source } => AppError::Validation { message, source },
        Failure::Error(error) => classify_error(error),
        Failure::Rpc { code, message } => AppError::EthereumRpc {
            message: message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_RPC_MESSAGE.to_string()),
            code: Some(code),
            source: None,
        },
        Failure::Message(message) => AppError::unknown(message),
        Failure::Unknown => AppError::unknown(UNKNOWN_ERROR_MESSAGE),
    }
}

fn classify_error(error: Box<dyn StdError + Send + Sync + 'static>) -> AppError {
    let error = match error.downcast::<AppError>() {
        Ok(app) => return *app,
        Err(other) => other,
    };
    let error = match error.downcast::<serde_json::Error>() {
        Ok(decode) => return classify(Failure::from(*decode)),
        Err(other) => other,
    };
    let error = match error.downcast::<TransportError>() {
        Ok(transport) => return classify_transport(*transport),
        Err(other) => other,
    };
    if let Some(http) = error.downcast_ref::<reqwest::Error>() {
        if let Some(classified) = classify_reqwest(http) {
            return attach_source(classified, error);
        }
    }

    let message = error.to_string();
    let lowered = message.to_lowercase();
    let source: ErrorSource = Arc::from(error);

    if lowered.contains("network") {
        AppError::Network {
            message,
            source: Some(source),
        }
    } else if lowered.contains("wallet") || lowered.contains("metamask") {
        AppError::Wallet {
            message,
            source: Some(source),
        }
    } else {
        AppError::Unknown {
            message,
            source: Some(source),
        }
    }
}

/// Classify the reqwest failure modes that have a dedicated kind.
fn classify_reqwest(error: &reqwest::Error) -> Option<AppError> {
    if let Some(status) = error.status() {
        return Some(AppError::http(status.as_u16()));
    }
    if error.is_decode() {
        return Some(AppError::validation(format!(
            "Invalid response body: {error}"
        )));
    }
    if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        return Some(AppError::network(error.to_string()));
    }
    None
}

fn attach_source(error: AppError, source: Box<dyn StdError + Send + Sync + 'static>) -> AppError {
    let source: Option<ErrorSource> = Some(Arc::from(source));
    match error {
        AppError::Validation { message, .. } => AppError::Validation { message, source },
        AppError::Network { message, .. } => AppError::Network { message, source },
        AppError::Http { status, .. } => AppError::Http { status, source },
        other => other,
    }
}

/// Classify an alloy transport error.
fn classify_transport(error: TransportError) -> AppError {
    match error {
        RpcError::ErrorResp(payload) => classify(Failure::from(payload)),
        RpcError::SerError(err) => classify(Failure::from(err)),
        RpcError::DeserError { err, .. } => classify(Failure::from(err)),
        RpcError::Transport(TransportErrorKind::HttpError(http)) => AppError::http(http.status),
        RpcError::Transport(kind) => AppError::Network {
            message: kind.to_string(),
            source: Some(Arc::new(kind)),
        },
        RpcError::NullResp => AppError::network("Null response from RPC node"),
        other => AppError::unknown(other.to_string()),
    }
}
