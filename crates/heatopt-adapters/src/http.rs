// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! A small retrying REST client shared by the device, price and weather
//! adapters. Exponential backoff on transport failure, same shape as the
//! vendor REST client this crate's adapters are modeled on.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::warn;

use crate::errors::{AdapterError, AdapterResult};

#[derive(Clone)]
pub struct RetryingClient {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryingClient {
    pub fn new() -> AdapterResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Runs `request_fn` up to `max_retries` times with exponential
    /// backoff on transport-level failure, then maps the HTTP status to
    /// an [`AdapterError`].
    pub async fn send_checked<F, Fut>(&self, request_fn: F) -> AdapterResult<Response>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;
        let response = loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => break response,
                Err(e) if attempts >= self.max_retries => return Err(AdapterError::Http(e)),
                Err(e) => {
                    warn!(attempt = attempts, %e, "adapter request failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        };

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AdapterError::AuthFailed),
            status if status.is_success() => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AdapterError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
