// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! [`Timeline`] implementations. `TracingTimeline` is the always-on
//! fallback; `HttpTimeline` forwards to a user-facing notification
//! webhook and degrades to tracing-only when the webhook is unreachable.

use async_trait::async_trait;
use heatopt_core::traits::Timeline;
use tracing::{info, warn};

use crate::http::RetryingClient;

#[derive(Default)]
pub struct TracingTimeline;

impl TracingTimeline {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Timeline for TracingTimeline {
    async fn emit(&self, title: &str, body: &str, icon: Option<&str>) {
        info!(title, body, icon, "timeline event");
    }

    async fn notify(&self, excerpt: &str) {
        info!(excerpt, "notification");
    }
}

/// Posts timeline events to an external notification webhook, falling
/// back to [`TracingTimeline`] when the request fails so a flaky
/// notification endpoint never blocks the hourly cycle.
pub struct HttpTimeline {
    base_url: String,
    client: RetryingClient,
    fallback: TracingTimeline,
}

impl HttpTimeline {
    pub fn new(base_url: impl Into<String>) -> Result<Self, heatopt_types::error::CoreError> {
        Ok(Self {
            base_url: base_url.into(),
            client: RetryingClient::new()?,
            fallback: TracingTimeline::new(),
        })
    }
}

#[async_trait]
impl Timeline for HttpTimeline {
    async fn emit(&self, title: &str, body: &str, icon: Option<&str>) {
        let url = format!("{}/api/v1/timeline", self.base_url);
        let result = self
            .client
            .send_checked(|| {
                self.client
                    .inner()
                    .post(&url)
                    .json(&serde_json::json!({ "title": title, "body": body, "icon": icon }))
                    .send()
            })
            .await;
        if let Err(e) = result {
            warn!(%e, "timeline webhook unreachable, falling back to local log");
            self.fallback.emit(title, body, icon).await;
        }
    }

    async fn notify(&self, excerpt: &str) {
        let url = format!("{}/api/v1/notifications", self.base_url);
        let result = self
            .client
            .send_checked(|| {
                self.client
                    .inner()
                    .post(&url)
                    .json(&serde_json::json!({ "excerpt": excerpt }))
                    .send()
            })
            .await;
        if let Err(e) = result {
            warn!(%e, "notification webhook unreachable, falling back to local log");
            self.fallback.notify(excerpt).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracing_timeline_emit_does_not_panic() {
        let timeline = TracingTimeline::new();
        timeline.emit("Heating boost", "cheap hour ahead", Some("mdi:fire")).await;
        timeline.notify("boost window starting").await;
    }

    #[tokio::test]
    async fn http_timeline_falls_back_on_unreachable_webhook() {
        let timeline = HttpTimeline::new("http://127.0.0.1:1").unwrap();
        timeline.emit("Heating boost", "cheap hour ahead", None).await;
        timeline.notify("boost window starting").await;
    }
}
