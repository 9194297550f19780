// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! reqwest-backed explorer transport.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use tracing::trace;

use crate::errors::{classify, AppError};
use crate::explorer::types::{ExplorerEnvelope, ExplorerRequest};

/// Issues explorer requests over HTTP GET.
///
/// Non-2xx responses become [`AppError::Http`]; connect and timeout failures
/// become [`AppError::Network`]; an undecodable body becomes
/// [`AppError::Validation`].
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl tower::Service<ExplorerRequest> for HttpTransport {
    type Response = ExplorerEnvelope;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ExplorerRequest) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let response = client.get(request.url).send().await.map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::http(status.as_u16()));
            }

            let envelope = response
                .json::<ExplorerEnvelope>()
                .await
                .map_err(classify)?;
            trace!(status = %envelope.status, message = %envelope.message, "Explorer envelope");

            Ok(envelope)
        })
    }
}
