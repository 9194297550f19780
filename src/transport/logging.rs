// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging layer for the explorer transport.
//!
//! This module implements a logging layer that uses `tracing` to record
//! explorer request/response information for debugging and observability.
//! Request URLs carry the API key, so only the `module.action` label and the
//! endpoint are ever logged.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::time::Instant;
use tower::Layer;
use tracing::{debug, trace, warn, Instrument};

use crate::errors::AppError;
use crate::explorer::types::{ExplorerEnvelope, ExplorerRequest};

/// A Tower layer that adds logging/tracing to explorer requests.
///
/// # Example
///
/// ```rust
/// use walletscope::transport::{HttpTransport, LoggingLayer};
/// use std::time::Duration;
/// use tower::Layer;
///
/// let transport = LoggingLayer::new().layer(HttpTransport::new(Duration::from_secs(15))?);
/// # Ok::<(), walletscope::AppError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    /// Whether to log response payloads (can be verbose)
    log_responses: bool,
}

impl LoggingLayer {
    /// Creates a new logging layer with default settings.
    ///
    /// By default, only timing and errors are logged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables logging of response payloads.
    ///
    /// Warning: transaction lists can be large.
    pub fn with_response_logging(mut self) -> Self {
        self.log_responses = true;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            log_responses: self.log_responses,
        }
    }
}

/// A Tower service that logs explorer requests and responses.
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    log_responses: bool,
}

impl<S> tower::Service<ExplorerRequest> for LoggingService<S>
where
    S: tower::Service<ExplorerRequest, Response = ExplorerEnvelope, Error = AppError>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = ExplorerEnvelope;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: ExplorerRequest) -> Self::Future {
        let log_responses = self.log_responses;
        let mut service = self.service.clone();

        let label = request.label();
        let span = tracing::info_span!(
            "explorer_call",
            call = %label,
            endpoint = %request.endpoint(),
            duration_ms = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                debug!("Explorer request: {label}");

                let result = service.call(request).await;
                let duration = start.elapsed();
                tracing::Span::current().record("duration_ms", duration.as_millis() as u64);

                match &result {
                    Ok(envelope) => {
                        if log_responses {
                            trace!(
                                response = ?envelope,
                                duration_ms = %duration.as_millis(),
                                "Explorer response"
                            );
                        } else {
                            debug!(
                                status = %envelope.status,
                                duration_ms = %duration.as_millis(),
                                "Explorer response: {label}"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            kind = %e.kind(),
                            duration_ms = %duration.as_millis(),
                            "Explorer error: {label}"
                        );
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
